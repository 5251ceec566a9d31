use crate::gff::{read_features, Feature};
use crate::utils::{substitute_base, Error, Result, BASES};
use bio::io::fasta;
use rand::seq::index;
use rand::Rng;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Substitutes `n_bases` distinct random positions using the fixed base
/// substitution table, so every touched position really changes.
pub fn mutate<R: Rng>(rng: &mut R, sequence: &str, n_bases: usize) -> Result<String> {
    if !sequence.bytes().all(|base| BASES.contains(&base)) {
        return Err(Error::InvalidDna {
            sequence: sequence.to_string(),
        });
    }

    let mut bases = sequence.as_bytes().to_vec();
    let size = n_bases.min(bases.len());
    for position in index::sample(rng, bases.len(), size) {
        bases[position] = substitute_base(bases[position]);
    }

    Ok(String::from_utf8_lossy(&bases).into_owned())
}

// Phred+33 codes for the ten highest quality scores (Q31..Q40)
pub fn quality_string<R: Rng>(rng: &mut R, n_bases: usize) -> String {
    (0..n_bases)
        .map(|_| rng.random_range(64u8..=73) as char)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub seqid: String,
    pub start: u64,
    pub end: u64,
    pub sequence: String,
}

/// Transcript sampler backed by a GFF annotation and its FASTA genome.
pub struct TranscriptSource {
    features: Vec<Feature>,
    sequences: HashMap<String, String>,
    length: usize,
}

impl TranscriptSource {
    pub fn new(gff_path: &Path, fasta_path: &Path, length: usize) -> Result<Self> {
        if !fasta_path.exists() {
            return Err(Error::NotFound {
                path: fasta_path.to_path_buf(),
            });
        }

        let features = read_features(gff_path, length as u64)?;

        let reader = fasta::Reader::new(BufReader::new(File::open(fasta_path)?));
        let mut sequences = HashMap::new();
        for record in reader.records() {
            let record = record?;
            sequences.insert(
                record.id().to_string(),
                String::from_utf8_lossy(record.seq()).to_uppercase(),
            );
        }

        Ok(TranscriptSource {
            features,
            sequences,
            length,
        })
    }

    /// Samples up to `n` distinct features and slices `length` bases from
    /// each feature start, clamped to the sequence bounds.
    pub fn transcripts<R: Rng>(&self, rng: &mut R, n: usize) -> Result<Vec<Transcript>> {
        let size = n.min(self.features.len());
        let mut transcripts = Vec::with_capacity(size);

        for chosen in index::sample(rng, self.features.len(), size) {
            let feature = &self.features[chosen];
            let sequence =
                self.sequences
                    .get(&feature.seqname)
                    .ok_or_else(|| Error::MissingSequence {
                        id: feature.seqname.clone(),
                    })?;

            let begin = (feature.start as usize).saturating_sub(1).min(sequence.len());
            let end = (begin + self.length).min(sequence.len());

            transcripts.push(Transcript {
                seqid: feature.seqname.clone(),
                start: feature.start,
                end: feature.start + (end - begin) as u64,
                sequence: sequence[begin..end].to_string(),
            });
        }

        Ok(transcripts)
    }
}
