use clap::Parser;
use slideseq_tools::{
    cli::{init_verbose, Cli, Command},
    commands::{check, coordinates, simulate},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Check(_) => "check",
        Command::Coordinates(_) => "coordinates",
        Command::Simulate(_) => "simulate",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        subcommand_name
    );
    match cli.command {
        Command::Check(args) => check::check(args)?,
        Command::Coordinates(args) => coordinates::coordinates(args)?,
        Command::Simulate(args) => simulate::simulate(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
