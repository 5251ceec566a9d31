use crate::cli::SimulateArgs;
use crate::config::samplesheet::SheetRecord;
use crate::synth::slideseq::{SlideSeq, DEFAULT_READ_LENGTH};
use crate::utils::{Error, Result};
use std::fs;
use std::path::Path;

const GFF_SUBPATH: &str = "Annotation/Genes/genes.gtf";
const FASTA_SUBPATH: &str = "Sequence/WholeGenomeFasta/genome.fa";

pub fn simulate(args: SimulateArgs) -> Result<()> {
    let gff_path = args.genome_path.join(GFF_SUBPATH);
    if !gff_path.exists() {
        return Err(Error::NotFound { path: gff_path });
    }
    let fasta_path = args.genome_path.join(FASTA_SUBPATH);
    if !fasta_path.exists() {
        return Err(Error::NotFound { path: fasta_path });
    }

    if args.out_dir.exists() && !args.out_dir.is_dir() {
        return Err(Error::NotADirectory {
            path: args.out_dir.clone(),
        });
    }
    fs::create_dir_all(&args.out_dir)?;

    let slideseq = SlideSeq::new(
        &args.mask_path,
        &gff_path,
        &fasta_path,
        DEFAULT_READ_LENGTH,
        args.n_beads,
    )?;

    let mut rng = rand::rng();
    let mut records = Vec::with_capacity(args.n_samples * args.n_files);

    for sample_num in 1..=args.n_samples {
        let sample = format!("sample{sample_num}");

        let puck = slideseq.generate_puck(&mut rng);
        let puck_path = args.out_dir.join(format!("{sample}.csv"));
        puck.save(&puck_path, 4)?;

        for file_num in 1..=args.n_files {
            let prefix = format!("{sample}-file{file_num}");
            let path_prefix = args.out_dir.join(format!("{sample}_L{file_num:03}"));
            log::info!("Creating {}", path_prefix.display());

            let (reads1, reads2) = slideseq.generate_reads(&mut rng, &puck, &prefix, args.n_reads)?;
            let (fastq_1, fastq_2) = SlideSeq::write_fastq(&reads1, &reads2, &path_prefix)?;

            records.push(SheetRecord {
                sample: sample.clone(),
                fastq_1: fastq_1.to_string_lossy().into_owned(),
                fastq_2: fastq_2.to_string_lossy().into_owned(),
                puck: puck_path.to_string_lossy().into_owned(),
                read_structure: args.read_structure.clone(),
                genome: args.genome_path.to_string_lossy().into_owned(),
            });
        }
    }

    let samplesheet_path = args.out_dir.join("samplesheet.csv");
    write_samplesheet(&samplesheet_path, &records)?;
    log::info!("Wrote sample sheet {}", samplesheet_path.display());

    Ok(())
}

fn write_samplesheet(path: &Path, records: &[SheetRecord]) -> Result<()> {
    let write_error = |source| Error::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;

    for record in records {
        writer.serialize(record).map_err(write_error)?;
    }

    writer.flush()?;
    Ok(())
}
