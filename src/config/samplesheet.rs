use crate::config::read_structure::ReadStructure;
use crate::utils::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// Conventional layout of an AWS iGenomes reference directory
const GFF_SUBPATH: &str = "Annotation/Genes/genes.gtf";
const STAR_INDEX_SUBPATH: &str = "Sequence/STARIndex";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub sample: String,
    pub fastq_1: String,
    pub fastq_2: String,
    pub puck: String,
    pub read_structure: String,
    pub genome: String,
}

/// How the `genome` column is interpreted: a plain reference file, or an
/// iGenomes-style directory from which annotation and index paths derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenomeMode {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct GenomeFiles {
    pub gff: PathBuf,
    pub star_index: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AugmentedRecord {
    pub record: SheetRecord,
    pub min_length: usize,
    pub umi_tools_regex: String,
    pub puck_name: String,
    pub genome_files: Option<GenomeFiles>,
}

impl AugmentedRecord {
    // Validates one record (paths already resolved) and computes the derived
    // columns. `row` is the 1-based data row used in error reports.
    fn validate(record: SheetRecord, row: usize, mode: GenomeMode) -> Result<Self> {
        let missing = |column: &'static str, path: &Path| Error::MissingFile {
            row,
            sample: record.sample.clone(),
            column,
            path: path.to_path_buf(),
        };

        for (column, value) in [
            ("fastq_1", &record.fastq_1),
            ("fastq_2", &record.fastq_2),
            ("puck", &record.puck),
        ] {
            let path = Path::new(value);
            if !path.is_file() {
                return Err(missing(column, path));
            }
        }

        let genome = Path::new(&record.genome);
        let genome_files = match mode {
            GenomeMode::File => {
                if !genome.exists() {
                    return Err(missing("genome", genome));
                }
                None
            }
            GenomeMode::Directory => {
                if !genome.is_dir() {
                    return Err(missing("genome", genome));
                }
                let gff = genome.join(GFF_SUBPATH);
                if !gff.is_file() {
                    return Err(missing("gff", &gff));
                }
                let star_index = genome.join(STAR_INDEX_SUBPATH);
                if !star_index.is_dir() {
                    return Err(missing("star_index", &star_index));
                }
                Some(GenomeFiles { gff, star_index })
            }
        };

        let structure =
            ReadStructure::new(&record.read_structure).map_err(|source| Error::InvalidStructure {
                row,
                sample: record.sample.clone(),
                source,
            })?;

        let puck_name = Path::new(&record.puck)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(AugmentedRecord {
            min_length: structure.min_length(),
            umi_tools_regex: structure.umi_tools_regex(),
            puck_name,
            genome_files,
            record,
        })
    }
}

/// Slide-seq experiment sample sheet.
///
/// Loading checks per-sample consistency; augmentation resolves paths,
/// validates every row and computes the derived columns consumed by the
/// downstream pipeline.
#[derive(Debug)]
pub struct SampleSheet {
    path: PathBuf,
    launch_dir: PathBuf,
    genome_mode: GenomeMode,
    records: Vec<SheetRecord>,
    augmented: Option<Vec<AugmentedRecord>>,
}

impl SampleSheet {
    pub fn new(path: &Path, launch_dir: &Path, genome_mode: GenomeMode) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let read_error = |source| Error::ReadError {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(read_error)?;
        let records: Vec<SheetRecord> = reader
            .deserialize()
            .collect::<std::result::Result<_, _>>()
            .map_err(read_error)?;

        Self::check_duplicates(&records)?;

        Ok(SampleSheet {
            path: path.to_path_buf(),
            launch_dir: launch_dir.to_path_buf(),
            genome_mode,
            records,
            augmented: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[SheetRecord] {
        &self.records
    }

    // A sample may span multiple FASTQ pairs (split lanes), but all of its
    // other metadata must agree across rows.
    fn check_duplicates(records: &[SheetRecord]) -> Result<()> {
        let mut first_seen: HashMap<&str, &SheetRecord> = HashMap::new();

        for record in records {
            match first_seen.entry(record.sample.as_str()) {
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
                Entry::Occupied(entry) => {
                    let first = entry.get();
                    let conflicting = if record.puck != first.puck {
                        Some("puck")
                    } else if record.read_structure != first.read_structure {
                        Some("read_structure")
                    } else if record.genome != first.genome {
                        Some("genome")
                    } else {
                        None
                    };
                    if let Some(column) = conflicting {
                        return Err(Error::InconsistentSample {
                            sample: record.sample.clone(),
                            column: column.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    // Sheets are often authored with paths relative to the pipeline launch
    // directory rather than the sheet location.
    fn resolve(&self, path: &str) -> Result<String> {
        let original = Path::new(path);
        if original.is_absolute() {
            return Ok(path.to_string());
        }

        let resolved = self.launch_dir.join(original);
        if !resolved.exists() {
            return Err(Error::NotFoundRelative {
                path: original.to_path_buf(),
                resolved,
            });
        }

        Ok(std::path::absolute(&resolved)?.to_string_lossy().into_owned())
    }

    /// Resolves paths and validates/derives every row. Cached after the
    /// first successful call; fails fast on the first invalid row.
    pub fn augment(&mut self) -> Result<&[AugmentedRecord]> {
        if self.augmented.is_none() {
            let mut augmented = Vec::with_capacity(self.records.len());

            for (index, record) in self.records.iter().enumerate() {
                let mut resolved = record.clone();
                resolved.fastq_1 = self.resolve(&record.fastq_1)?;
                resolved.fastq_2 = self.resolve(&record.fastq_2)?;
                resolved.puck = self.resolve(&record.puck)?;
                augmented.push(AugmentedRecord::validate(
                    resolved,
                    index + 1,
                    self.genome_mode,
                )?);
            }

            self.augmented = Some(augmented);
        }

        Ok(self.augmented.as_deref().unwrap_or_default())
    }

    /// Writes the augmented sheet as CSV, preserving row order.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.augment()?;
        let augmented = self.augmented.as_deref().unwrap_or_default();

        let mut writer = csv::Writer::from_path(path).map_err(|source| Error::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        let write_error = |source| Error::WriteError {
            path: path.to_path_buf(),
            source,
        };

        let mut header = vec![
            "sample",
            "fastq_1",
            "fastq_2",
            "puck",
            "read_structure",
            "genome",
            "min_length",
            "umi_tools_regex",
            "puck_name",
        ];
        if self.genome_mode == GenomeMode::Directory {
            header.extend(["gff", "star_index"]);
        }
        writer.write_record(&header).map_err(write_error)?;

        for augmented_record in augmented {
            let record = &augmented_record.record;
            let mut fields = vec![
                record.sample.clone(),
                record.fastq_1.clone(),
                record.fastq_2.clone(),
                record.puck.clone(),
                record.read_structure.clone(),
                record.genome.clone(),
                augmented_record.min_length.to_string(),
                augmented_record.umi_tools_regex.clone(),
                augmented_record.puck_name.clone(),
            ];
            if let Some(genome_files) = &augmented_record.genome_files {
                fields.push(genome_files.gff.to_string_lossy().into_owned());
                fields.push(genome_files.star_index.to_string_lossy().into_owned());
            }
            writer.write_record(&fields).map_err(write_error)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const STRUCTURE: &str = "8C18U6C2X9M";

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    // Creates FASTQ/puck/genome fixtures for one sample and returns the rows
    // referencing them with absolute paths.
    fn fixture_rows(dir: &Path, sample: &str, n_pairs: usize) -> Vec<String> {
        let puck = dir.join(format!("{sample}.csv"));
        touch(&puck);
        let genome = dir.join("genome.fa");
        touch(&genome);

        (1..=n_pairs)
            .map(|pair| {
                let fastq_1 = dir.join(format!("{sample}_L{pair:03}.R1.fastq.gz"));
                let fastq_2 = dir.join(format!("{sample}_L{pair:03}.R2.fastq.gz"));
                touch(&fastq_1);
                touch(&fastq_2);
                format!(
                    "{sample},{},{},{},{STRUCTURE},{}",
                    fastq_1.display(),
                    fastq_2.display(),
                    puck.display(),
                    genome.display(),
                )
            })
            .collect()
    }

    fn write_sheet(dir: &Path, rows: &[String]) -> PathBuf {
        let path = dir.join("samplesheet.csv");
        let mut content = String::from("sample,fastq_1,fastq_2,puck,read_structure,genome\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn load(path: &Path) -> Result<SampleSheet> {
        SampleSheet::new(path, Path::new("."), GenomeMode::File)
    }

    #[test]
    fn new_with_missing_sheet_err() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn new_with_missing_column_err() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("samplesheet.csv");
        fs::write(&path, "sample,fastq_1\nsample1,reads.fastq.gz\n").unwrap();
        let result = load(&path);
        assert!(matches!(result, Err(Error::ReadError { .. })));
    }

    #[test]
    fn divergent_metadata_for_one_sample_err() {
        let dir = TempDir::new().unwrap();
        let mut rows = fixture_rows(dir.path(), "sample1", 2);
        let other_genome = dir.path().join("other.fa");
        touch(&other_genome);
        rows[1] = rows[1].rsplit_once(',').unwrap().0.to_string()
            + &format!(",{}", other_genome.display());
        let path = write_sheet(dir.path(), &rows);

        match load(&path) {
            Err(Error::InconsistentSample { sample, column }) => {
                assert_eq!(sample, "sample1");
                assert_eq!(column, "genome");
            }
            other => panic!("expected InconsistentSample, got {other:?}"),
        }
    }

    #[test]
    fn divergent_fastq_pairs_for_one_sample_ok() {
        let dir = TempDir::new().unwrap();
        let rows = fixture_rows(dir.path(), "sample1", 3);
        let path = write_sheet(dir.path(), &rows);
        let sheet = load(&path).unwrap();
        assert_eq!(sheet.records().len(), 3);
    }

    #[test]
    fn augment_derives_columns() {
        let dir = TempDir::new().unwrap();
        let rows = fixture_rows(dir.path(), "sample1", 1);
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = load(&path).unwrap();
        let augmented = sheet.augment().unwrap();
        assert_eq!(augmented.len(), 1);
        assert_eq!(augmented[0].min_length, 43);
        assert_eq!(augmented[0].puck_name, "sample1");
        assert!(augmented[0].umi_tools_regex.contains("(?P<cell_2>"));
        assert!(augmented[0].genome_files.is_none());
    }

    #[test]
    fn augment_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let rows = fixture_rows(dir.path(), "sample1", 1);
        // rewrite the FASTQ and puck paths relative to the launch directory;
        // the genome column is never resolved and stays absolute
        let fields: Vec<&str> = rows[0].split(',').collect();
        let file_name = |field: &str| {
            Path::new(field)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        };
        let relative = format!(
            "sample1,{},{},{},{STRUCTURE},{}",
            file_name(fields[1]),
            file_name(fields[2]),
            file_name(fields[3]),
            fields[5],
        );
        let path = write_sheet(dir.path(), &[relative]);

        let mut sheet = SampleSheet::new(&path, dir.path(), GenomeMode::File).unwrap();
        let augmented = sheet.augment().unwrap();
        assert!(Path::new(&augmented[0].record.fastq_1).is_absolute());
        assert!(Path::new(&augmented[0].record.puck).is_absolute());
    }

    #[test]
    fn augment_with_unresolvable_relative_path_err() {
        let dir = TempDir::new().unwrap();
        let rows = vec![format!(
            "sample1,missing.R1.fastq.gz,missing.R2.fastq.gz,puck.csv,{STRUCTURE},genome.fa"
        )];
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = SampleSheet::new(&path, dir.path(), GenomeMode::File).unwrap();
        assert!(matches!(
            sheet.augment(),
            Err(Error::NotFoundRelative { .. })
        ));
    }

    #[test]
    fn augment_with_missing_fastq_err() {
        let dir = TempDir::new().unwrap();
        let mut rows = fixture_rows(dir.path(), "sample1", 1);
        rows[0] = rows[0].replace("L001.R1", "missing.R1");
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = load(&path).unwrap();
        match sheet.augment() {
            Err(Error::MissingFile { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "fastq_1");
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn augment_with_invalid_structure_err() {
        let dir = TempDir::new().unwrap();
        let rows = fixture_rows(dir.path(), "sample1", 1);
        let broken = rows[0].replace(STRUCTURE, "8C18U");
        let path = write_sheet(dir.path(), &[broken]);

        let mut sheet = load(&path).unwrap();
        match sheet.augment() {
            Err(Error::InvalidStructure { row, sample, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(sample, "sample1");
            }
            other => panic!("expected InvalidStructure, got {other:?}"),
        }
    }

    #[test]
    fn save_writes_augmented_sheet() {
        let dir = TempDir::new().unwrap();
        let rows = fixture_rows(dir.path(), "sample1", 2);
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = load(&path).unwrap();
        let out = dir.path().join("augmented.csv");
        sheet.save(&out).unwrap();

        assert!(out.exists());
        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|column| column == "min_length"));
        assert!(headers.iter().any(|column| column == "umi_tools_regex"));
        assert!(headers.iter().any(|column| column == "puck_name"));
        let written: Vec<csv::StringRecord> =
            reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn save_in_directory_mode_emits_genome_columns() {
        let dir = TempDir::new().unwrap();
        let genome_dir = dir.path().join("genome");
        fs::create_dir_all(genome_dir.join("Annotation/Genes")).unwrap();
        fs::create_dir_all(genome_dir.join("Sequence/STARIndex")).unwrap();
        touch(&genome_dir.join("Annotation/Genes/genes.gtf"));

        let mut rows = fixture_rows(dir.path(), "sample1", 1);
        rows[0] = rows[0].rsplit_once(',').unwrap().0.to_string()
            + &format!(",{}", genome_dir.display());
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = SampleSheet::new(&path, Path::new("."), GenomeMode::Directory).unwrap();
        let out = dir.path().join("augmented.csv");
        sheet.save(&out).unwrap();

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|column| column == "gff"));
        assert!(headers.iter().any(|column| column == "star_index"));
        let record = reader.records().next().unwrap().unwrap();
        assert!(record.iter().any(|field| field.ends_with("genes.gtf")));
    }

    #[test]
    fn directory_mode_without_star_index_err() {
        let dir = TempDir::new().unwrap();
        let genome_dir = dir.path().join("genome");
        fs::create_dir_all(genome_dir.join("Annotation/Genes")).unwrap();
        touch(&genome_dir.join("Annotation/Genes/genes.gtf"));

        let mut rows = fixture_rows(dir.path(), "sample1", 1);
        rows[0] = rows[0].rsplit_once(',').unwrap().0.to_string()
            + &format!(",{}", genome_dir.display());
        let path = write_sheet(dir.path(), &rows);

        let mut sheet = SampleSheet::new(&path, Path::new("."), GenomeMode::Directory).unwrap();
        match sheet.augment() {
            Err(Error::MissingFile { column, .. }) => assert_eq!(column, "star_index"),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }
}
