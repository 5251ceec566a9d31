use crate::config::read_structure::StructureError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{} doesn't exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("{} and {} don't exist", .path.display(), .resolved.display())]
    NotFoundRelative { path: PathBuf, resolved: PathBuf },

    #[error("sample sheet {} can't be read: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{column} has multiple values for {sample} sample")]
    InconsistentSample { sample: String, column: String },

    #[error("row {row} ({sample}): {source}")]
    InvalidStructure {
        row: usize,
        sample: String,
        #[source]
        source: StructureError,
    },

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("row {row} ({sample}): {column} path {} doesn't exist", .path.display())]
    MissingFile {
        row: usize,
        sample: String,
        column: &'static str,
        path: PathBuf,
    },

    #[error("{} can't be written: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} already exists and is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("mask image {} can't be decoded: {reason}", .path.display())]
    Image { path: PathBuf, reason: String },

    #[error("{sequence} is not DNA")]
    InvalidDna { sequence: String },

    #[error("{seq1} and {seq2} don't have same length")]
    LengthMismatch { seq1: String, seq2: String },

    #[error("sequence {id} is missing from the FASTA file")]
    MissingSequence { id: String },

    #[error("the puck has no beads")]
    EmptyPuck,

    #[error("no transcripts could be sampled from the annotation")]
    NoTranscripts,

    #[error("cannot parse GFF attribute: {field}")]
    GffAttribute { field: String },

    #[error("GFF record doesn't contain 9 columns: {record}")]
    GffRecord { record: String },

    #[error("GFF record has a non-numeric coordinate: {record}")]
    GffCoordinate { record: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
