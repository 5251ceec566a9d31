use crate::utils::{Error, Result};
use rand::Rng;

pub const BASES: [u8; 4] = *b"ACGT";

// UP primer anchoring read 1 between the two bead barcode segments
pub const UP_PRIMER: &str = "TCTTCAGCGTTCCCGAGA";

// Fixed substitution table so a mutated position always changes
pub fn substitute_base(base: u8) -> u8 {
    match base {
        b'A' => b'C',
        b'C' => b'T',
        b'G' => b'A',
        b'T' => b'G',
        other => other,
    }
}

pub fn random_sequence<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| BASES[rng.random_range(0..BASES.len())] as char)
        .collect()
}

pub fn hamming(seq1: &str, seq2: &str) -> Result<usize> {
    if seq1.len() != seq2.len() {
        return Err(Error::LengthMismatch {
            seq1: seq1.to_string(),
            seq2: seq2.to_string(),
        });
    }
    Ok(seq1
        .bytes()
        .zip(seq2.bytes())
        .filter(|(base1, base2)| base1 != base2)
        .count())
}
