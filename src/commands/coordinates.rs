use crate::cli::CoordinatesArgs;
use crate::synth::puck::{mask_coordinates, save_coordinates};
use crate::utils::Result;
use rand::seq::index;

// precision used by pucks published with the original protocol
const COORDINATE_PRECISION: usize = 15;

pub fn coordinates(args: CoordinatesArgs) -> Result<()> {
    let coordinates = mask_coordinates(&args.mask_path)?;

    let mut rng = rand::rng();
    let n_beads = args.n_beads.min(coordinates.len());
    let sampled: Vec<(f64, f64)> = index::sample(&mut rng, coordinates.len(), n_beads)
        .iter()
        .map(|chosen| coordinates[chosen])
        .collect();

    save_coordinates(&sampled, &args.output_path, COORDINATE_PRECISION)?;
    log::info!(
        "Wrote {} bead coordinates to {}",
        sampled.len(),
        args.output_path.display()
    );

    Ok(())
}
