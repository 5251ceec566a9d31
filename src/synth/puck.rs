use crate::utils::{random_sequence, Error, Result};
use rand::seq::index;
use rand::Rng;
use std::path::Path;
use tiny_skia::Pixmap;

/// Bead coordinates from a black-on-white PNG mask: every fully black pixel
/// is a bead. Pixel indices are rotated by 270 degrees, so a bead at
/// row r, column c lands at (c, -r).
pub fn mask_coordinates(path: &Path) -> Result<Vec<(f64, f64)>> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    let pixmap = Pixmap::load_png(path).map_err(|e| Error::Image {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut coordinates = Vec::new();
    for row in 0..pixmap.height() {
        for column in 0..pixmap.width() {
            let pixel = match pixmap.pixel(column, row) {
                Some(pixel) => pixel,
                None => continue,
            };
            if pixel.red() == 0 && pixel.green() == 0 && pixel.blue() == 0 && pixel.alpha() == 255
            {
                coordinates.push((column as f64, -(row as f64)));
            }
        }
    }

    Ok(coordinates)
}

/// Writes a headerless `x,y` coordinate table with fixed decimal precision.
pub fn save_coordinates(coordinates: &[(f64, f64)], path: &Path, precision: usize) -> Result<()> {
    let write_error = |source| Error::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;

    for (x, y) in coordinates {
        writer
            .write_record([format!("{x:.precision$}"), format!("{y:.precision$}")])
            .map_err(write_error)?;
    }

    writer.flush()?;
    Ok(())
}

/// Barcoded bead coordinate table for one synthetic puck.
#[derive(Debug, Clone)]
pub struct Puck {
    pub barcodes: Vec<String>,
    pub coordinates: Vec<(f64, f64)>,
}

impl Puck {
    /// Samples `n_beads` coordinates without replacement (capped at the
    /// available count) and pairs each with a fresh random barcode.
    pub fn generate<R: Rng>(
        rng: &mut R,
        coordinates: &[(f64, f64)],
        n_beads: usize,
        barcode_length: usize,
    ) -> Puck {
        let n_beads = n_beads.min(coordinates.len());
        let chosen = index::sample(rng, coordinates.len(), n_beads);

        let coordinates = chosen.iter().map(|index| coordinates[index]).collect();
        let barcodes = (0..n_beads)
            .map(|_| random_sequence(rng, barcode_length))
            .collect();

        Puck {
            barcodes,
            coordinates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    /// Writes the headerless `barcode,x,y` table consumed by the pipeline.
    pub fn save(&self, path: &Path, precision: usize) -> Result<()> {
        let write_error = |source| Error::WriteError {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(write_error)?;

        for (barcode, (x, y)) in self.barcodes.iter().zip(&self.coordinates) {
            writer
                .write_record([
                    barcode.clone(),
                    format!("{x:.precision$}"),
                    format!("{y:.precision$}"),
                ])
                .map_err(write_error)?;
        }

        writer.flush()?;
        Ok(())
    }
}
