use crate::synth::puck::{mask_coordinates, Puck};
use crate::synth::sequencing::{mutate, quality_string, TranscriptSource};
use crate::utils::{random_sequence, Error, Result, UP_PRIMER};
use bio::io::fastq;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::Rng;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_READ_LENGTH: usize = 50;
pub const DEFAULT_N_BEADS: usize = 80_000;

const BARCODE_LENGTH: usize = 14;
const UMI_LENGTH: usize = 9;
// fixed bases between the second barcode segment and the UMI
const LINKER: &str = "TC";
// roughly one read in 21 is truncated, simulating a short read
const TRUNCATION_ODDS: u32 = 21;

/// Synthetic Slide-seq dataset generator.
///
/// Read 1 follows the `8C18U6C2X9M` structure over a 14-base bead barcode;
/// read 2 is a lightly mutated transcript slice.
pub struct SlideSeq {
    mask_coords: Vec<(f64, f64)>,
    transcripts: TranscriptSource,
    n_beads: usize,
}

impl SlideSeq {
    pub fn new(
        mask_path: &Path,
        gff_path: &Path,
        fasta_path: &Path,
        length: usize,
        n_beads: usize,
    ) -> Result<Self> {
        let mask_coords = mask_coordinates(mask_path)?;
        let transcripts = TranscriptSource::new(gff_path, fasta_path, length)?;

        Ok(SlideSeq {
            mask_coords,
            transcripts,
            n_beads,
        })
    }

    pub fn generate_puck<R: Rng>(&self, rng: &mut R) -> Puck {
        Puck::generate(rng, &self.mask_coords, self.n_beads, BARCODE_LENGTH)
    }

    /// Generates `n_reads` read pairs drawing bead barcodes from `puck`.
    /// Transcripts are reused round-robin when the annotation yields fewer
    /// than `n_reads` features.
    pub fn generate_reads<R: Rng>(
        &self,
        rng: &mut R,
        puck: &Puck,
        prefix: &str,
        n_reads: usize,
    ) -> Result<(Vec<fastq::Record>, Vec<fastq::Record>)> {
        if puck.is_empty() {
            return Err(Error::EmptyPuck);
        }
        let transcripts = self.transcripts.transcripts(rng, n_reads)?;
        if transcripts.is_empty() {
            return Err(Error::NoTranscripts);
        }

        let mut reads1 = Vec::with_capacity(n_reads);
        let mut reads2 = Vec::with_capacity(n_reads);

        for counter in 0..n_reads {
            let barcode = &puck.barcodes[rng.random_range(0..puck.barcodes.len())];
            let n_mutations = rng.random_range(0..3);
            let barcode = mutate(rng, barcode, n_mutations)?;
            let n_mutations = rng.random_range(0..3);
            let up_primer = mutate(rng, UP_PRIMER, n_mutations)?;
            let umi = random_sequence(rng, UMI_LENGTH);

            let (barcode_head, barcode_tail) = barcode.split_at(barcode.len().min(8));
            let mut read1 = format!("{barcode_head}{up_primer}{barcode_tail}{LINKER}{umi}");
            if rng.random_range(0..TRUNCATION_ODDS) == 0 {
                read1.truncate(rng.random_range(0..read1.len()));
            }

            let quality = quality_string(rng, read1.len());
            reads1.push(fastq::Record::with_attrs(
                &format!("{prefix}-read{counter}"),
                Some(&format!("Synthetic read 1 {prefix}-{counter}")),
                read1.as_bytes(),
                quality.as_bytes(),
            ));

            let transcript = &transcripts[counter % transcripts.len()];
            let n_mutations = rng.random_range(0..6);
            let read2 = mutate(rng, &transcript.sequence, n_mutations)?;
            let quality = quality_string(rng, read2.len());
            reads2.push(fastq::Record::with_attrs(
                &format!("{prefix}-{counter}"),
                Some(&format!("Synthetic read 2 {prefix}-{counter}")),
                read2.as_bytes(),
                quality.as_bytes(),
            ));
        }

        Ok((reads1, reads2))
    }

    /// Writes the pair of gzipped FASTQ files and returns their paths.
    pub fn write_fastq(
        reads1: &[fastq::Record],
        reads2: &[fastq::Record],
        path_prefix: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        let fastq_1 = PathBuf::from(format!("{}.R1.fastq.gz", path_prefix.display()));
        let fastq_2 = PathBuf::from(format!("{}.R2.fastq.gz", path_prefix.display()));

        write_records(&fastq_1, reads1)?;
        write_records(&fastq_2, reads2)?;

        Ok((fastq_1, fastq_2))
    }
}

fn write_records(path: &Path, records: &[fastq::Record]) -> Result<()> {
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());

    for record in records {
        match record.desc() {
            Some(desc) => writeln!(encoder, "@{} {}", record.id(), desc)?,
            None => writeln!(encoder, "@{}", record.id())?,
        }
        encoder.write_all(record.seq())?;
        writeln!(encoder, "\n+")?;
        encoder.write_all(record.qual())?;
        writeln!(encoder)?;
    }

    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::read_structure::ReadStructure;
    use flate2::read::MultiGzDecoder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;
    use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

    fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        let mask_path = dir.join("puck.png");
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        pixmap.fill(Color::WHITE);
        let black = PremultipliedColorU8::from_rgba(0, 0, 0, 255).unwrap();
        for index in 0..200 {
            pixmap.pixels_mut()[index * 2] = black;
        }
        pixmap.save_png(&mask_path).unwrap();

        let gff_path = dir.join("genes.gtf");
        std::fs::write(
            &gff_path,
            "chr1\thavana\texon\t1\t100\t.\t+\t.\tgene_id \"g1\";\n\
             chr1\thavana\texon\t21\t90\t.\t+\t.\tgene_id \"g2\";\n",
        )
        .unwrap();

        let fasta_path = dir.join("genome.fa");
        std::fs::write(&fasta_path, format!(">chr1\n{}\n", "ACGT".repeat(30))).unwrap();

        (mask_path, gff_path, fasta_path)
    }

    fn slideseq(dir: &Path) -> SlideSeq {
        let (mask_path, gff_path, fasta_path) = write_fixtures(dir);
        SlideSeq::new(&mask_path, &gff_path, &fasta_path, DEFAULT_READ_LENGTH, 100).unwrap()
    }

    #[test]
    fn new_with_missing_mask_err() {
        let dir = TempDir::new().unwrap();
        let (_, gff_path, fasta_path) = write_fixtures(dir.path());
        let result = SlideSeq::new(
            &dir.path().join("file"),
            &gff_path,
            &fasta_path,
            DEFAULT_READ_LENGTH,
            100,
        );
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn generate_puck_caps_beads() {
        let dir = TempDir::new().unwrap();
        let slideseq = slideseq(dir.path());
        let mut rng = StdRng::seed_from_u64(42);
        let puck = slideseq.generate_puck(&mut rng);
        assert_eq!(puck.barcodes.len(), 100);
        assert!(puck.barcodes.iter().all(|barcode| barcode.len() == 14));
    }

    #[test]
    fn generated_reads_follow_the_read_structure() {
        let dir = TempDir::new().unwrap();
        let slideseq = slideseq(dir.path());
        let mut rng = StdRng::seed_from_u64(42);
        let puck = slideseq.generate_puck(&mut rng);
        let (reads1, reads2) = slideseq.generate_reads(&mut rng, &puck, "sample1", 50).unwrap();

        assert_eq!(reads1.len(), 50);
        assert_eq!(reads2.len(), 50);

        let structure = ReadStructure::new("8C18U6C2X9M").unwrap();
        let pattern = regex::Regex::new(&structure.umi_tools_regex()).unwrap();

        for (read1, read2) in reads1.iter().zip(&reads2) {
            assert_eq!(read1.seq().len(), read1.qual().len());
            assert_eq!(read2.seq().len(), read2.qual().len());
            assert_eq!(read2.seq().len(), DEFAULT_READ_LENGTH);

            // untruncated reads span the full nominal structure
            if read1.seq().len() == 43 {
                let sequence = String::from_utf8_lossy(read1.seq()).into_owned();
                assert!(pattern.is_match(&sequence), "{sequence}");
            }
        }
    }

    #[test]
    fn write_fastq_outputs_both_gzipped_files() {
        let dir = TempDir::new().unwrap();
        let slideseq = slideseq(dir.path());
        let mut rng = StdRng::seed_from_u64(42);
        let puck = slideseq.generate_puck(&mut rng);
        let (reads1, reads2) = slideseq.generate_reads(&mut rng, &puck, "sample1", 10).unwrap();

        let prefix = dir.path().join("sample1_L001");
        let (fastq_1, fastq_2) = SlideSeq::write_fastq(&reads1, &reads2, &prefix).unwrap();

        assert!(fastq_1.exists());
        assert!(fastq_2.exists());

        for path in [fastq_1, fastq_2] {
            let decoder = MultiGzDecoder::new(File::open(&path).unwrap());
            let lines = BufReader::new(decoder).lines().count();
            assert_eq!(lines, 4 * 10, "{}", path.display());
        }
    }
}
