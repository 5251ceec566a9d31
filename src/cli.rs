use crate::config::read_structure::ReadStructure;
use crate::config::samplesheet::GenomeMode;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name="slideseq-tools",
          version=env!("CARGO_PKG_VERSION"),
          about="Tools to process Slide-seq data",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Sample Sheet Checker")]
    Check(CheckArgs),
    #[clap(about = "Synthetic Bead Coordinates Generator")]
    Coordinates(CoordinatesArgs),
    #[clap(about = "Synthetic Dataset Generator")]
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct CheckArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "samplesheet")]
    #[clap(help = "Input sample sheet CSV")]
    #[clap(value_name = "CSV")]
    pub samplesheet_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Path of the augmented sample sheet CSV")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: PathBuf,

    #[clap(long = "launch-dir")]
    #[clap(help = "Directory used to resolve relative FASTQ and puck paths")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[arg(value_parser = check_dir_exists)]
    pub launch_dir: PathBuf,

    #[clap(long = "genome-dir")]
    #[clap(help = "Treat the genome column as an iGenomes directory and derive the gff and star_index columns")]
    pub genome_dir: bool,
}

impl CheckArgs {
    pub fn genome_mode(&self) -> GenomeMode {
        if self.genome_dir {
            GenomeMode::Directory
        } else {
            GenomeMode::File
        }
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct CoordinatesArgs {
    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "mask")]
    #[clap(help = "Black-on-white PNG mask of the puck")]
    #[clap(value_name = "PNG")]
    #[arg(value_parser = check_file_exists)]
    pub mask_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output coordinates CSV")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: PathBuf,

    #[clap(long = "n-beads")]
    #[clap(value_name = "N_BEADS")]
    #[clap(help = "Number of beads to keep")]
    #[clap(default_value = "80000")]
    pub n_beads: usize,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct SimulateArgs {
    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "mask")]
    #[clap(help = "Black-on-white PNG mask of the puck")]
    #[clap(value_name = "PNG")]
    #[arg(value_parser = check_file_exists)]
    pub mask_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genome")]
    #[clap(help = "iGenomes-style reference directory")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub genome_path: PathBuf,

    #[clap(long = "n-samples")]
    #[clap(value_name = "N_SAMPLES")]
    #[clap(help = "Number of samples")]
    #[clap(default_value = "2")]
    pub n_samples: usize,

    #[clap(long = "n-files")]
    #[clap(value_name = "N_FILES")]
    #[clap(help = "Number of FASTQ pairs per sample")]
    #[clap(default_value = "5")]
    pub n_files: usize,

    #[clap(long = "n-reads")]
    #[clap(value_name = "N_READS")]
    #[clap(help = "Number of reads per FASTQ pair")]
    #[clap(default_value = "20000")]
    pub n_reads: usize,

    #[clap(long = "n-beads")]
    #[clap(value_name = "N_BEADS")]
    #[clap(help = "Number of beads per puck")]
    #[clap(default_value = "80000")]
    pub n_beads: usize,

    #[clap(long = "read-structure")]
    #[clap(value_name = "STRUCTURE")]
    #[clap(help = "Read 1 structure")]
    #[clap(default_value = "8C18U6C2X9M")]
    #[arg(value_parser = check_read_structure)]
    pub read_structure: String,

    #[clap(long = "out-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Output directory")]
    #[clap(default_value = "data")]
    pub out_dir: PathBuf,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_prefix_path(s: &str) -> Result<PathBuf, String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn check_read_structure(s: &str) -> Result<String, String> {
    ReadStructure::new(s)
        .map(|structure| structure.definition().to_string())
        .map_err(|e| e.to_string())
}
