use crate::utils::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

static ATTRIBUTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?P<tag>\S+)\s"(?P<value>\S+)"\s*$"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GffRecord {
    pub seqname: String,
    pub source: String,
    pub feature: String,
    pub start: u64,
    pub end: u64,
    pub score: String,
    pub strand: String,
    pub frame: String,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub seqname: String,
    pub start: u64,
    pub end: u64,
}

// GTF attribute column: semicolon-separated `tag "value"` pairs.
pub fn parse_attributes(attributes: &str) -> Result<HashMap<String, String>> {
    let mut parsed = HashMap::new();

    for pair in attributes.split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        match ATTRIBUTE_PATTERN.captures(pair) {
            Some(captures) => {
                parsed.insert(captures["tag"].to_string(), captures["value"].to_string());
            }
            None => {
                return Err(Error::GffAttribute {
                    field: pair.to_string(),
                })
            }
        }
    }

    Ok(parsed)
}

pub fn parse_record(line: &str) -> Result<GffRecord> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != 9 {
        return Err(Error::GffRecord {
            record: line.to_string(),
        });
    }

    let coordinate = |value: &str| {
        value.parse::<u64>().map_err(|_| Error::GffCoordinate {
            record: line.to_string(),
        })
    };

    Ok(GffRecord {
        seqname: columns[0].to_string(),
        source: columns[1].to_string(),
        feature: columns[2].to_string(),
        start: coordinate(columns[3])?,
        end: coordinate(columns[4])?,
        score: columns[5].to_string(),
        strand: columns[6].to_string(),
        frame: columns[7].to_string(),
        attributes: parse_attributes(columns[8])?,
    })
}

/// Reads `(seqname, start, end)` for every feature spanning at least
/// `min_length` bases. Header comments and blank lines are skipped.
pub fn read_features(path: &Path, min_length: u64) -> Result<Vec<Feature>> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = BufReader::new(File::open(path)?);
    let mut features = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = parse_record(line)?;
        let span = record.end.saturating_sub(record.start) + 1;
        if span >= min_length {
            features.push(Feature {
                seqname: record.seqname,
                start: record.start,
                end: record.end,
            });
        }
    }

    Ok(features)
}
