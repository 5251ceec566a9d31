use crate::cli::CheckArgs;
use crate::config::samplesheet::SampleSheet;
use crate::utils::Result;

pub fn check(args: CheckArgs) -> Result<()> {
    let mut samplesheet = SampleSheet::new(
        &args.samplesheet_path,
        &args.launch_dir,
        args.genome_mode(),
    )?;
    log::info!(
        "Loaded {} rows from {}",
        samplesheet.records().len(),
        samplesheet.path().display()
    );

    samplesheet.save(&args.output_path)?;
    log::info!(
        "Wrote augmented sample sheet {}",
        args.output_path.display()
    );

    Ok(())
}
