use itertools::Itertools;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("read structure {structure} doesn't have at least a {symbol} to locate the {role}")]
    MissingSymbol {
        structure: String,
        symbol: char,
        role: &'static str,
    },
    #[error("read structure {structure} shouldn't contain {symbols}")]
    InvalidSymbol { structure: String, symbols: String },
    #[error("read structure {structure} doesn't have as many numbers as letters")]
    Malformed { structure: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Barcode,
    Umi,
    UpPrimer,
    Discard,
}

impl SegmentKind {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'C' => Some(SegmentKind::Barcode),
            'M' => Some(SegmentKind::Umi),
            'U' => Some(SegmentKind::UpPrimer),
            'X' => Some(SegmentKind::Discard),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            SegmentKind::Barcode => 'C',
            SegmentKind::Umi => 'M',
            SegmentKind::UpPrimer => 'U',
            SegmentKind::Discard => 'X',
        }
    }

    // Capture group prefix understood by the downstream extraction tool.
    // UP primer segments are matched but never captured.
    fn group_name(self) -> Option<&'static str> {
        match self {
            SegmentKind::Barcode => Some("cell"),
            SegmentKind::Umi => Some("umi"),
            SegmentKind::Discard => Some("discard"),
            SegmentKind::UpPrimer => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub length: usize,
    pub occurrence: usize,
}

/// Structure of read 1, e.g. `8C18U6C2X9M`: `C` is the bead barcode, `M` is
/// the UMI, `U` is the UP primer and `X` is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStructure {
    definition: String,
    segments: Vec<Segment>,
    expanded: String,
}

impl ReadStructure {
    pub fn new(structure: &str) -> Result<Self, StructureError> {
        let definition = structure.to_uppercase();
        Self::check_symbols(&definition)?;
        let segments = Self::parse_segments(&definition)?;
        let expanded = segments
            .iter()
            .map(|segment| segment.kind.symbol().to_string().repeat(segment.length))
            .collect();
        Ok(ReadStructure {
            definition,
            segments,
            expanded,
        })
    }

    fn check_symbols(structure: &str) -> Result<(), StructureError> {
        let letters: Vec<char> = structure
            .chars()
            .filter(|symbol| !symbol.is_ascii_digit())
            .collect();

        let invalid = letters
            .iter()
            .filter(|symbol| SegmentKind::from_symbol(**symbol).is_none())
            .unique()
            .sorted()
            .join(",");
        if !invalid.is_empty() {
            return Err(StructureError::InvalidSymbol {
                structure: structure.to_string(),
                symbols: invalid,
            });
        }

        for (symbol, role) in [('C', "bead barcode"), ('U', "UP primer"), ('M', "UMI")] {
            if !letters.contains(&symbol) {
                return Err(StructureError::MissingSymbol {
                    structure: structure.to_string(),
                    symbol,
                    role,
                });
            }
        }

        Ok(())
    }

    // Strict alternation of {digits}{letter} tokens; each segment consumes
    // `length` bases of the given kind.
    fn parse_segments(structure: &str) -> Result<Vec<Segment>, StructureError> {
        let malformed = || StructureError::Malformed {
            structure: structure.to_string(),
        };

        let mut segments = Vec::new();
        let mut occurrences: HashMap<char, usize> = HashMap::new();
        let mut chars = structure.chars().peekable();

        while chars.peek().is_some() {
            let mut digits = String::new();
            while let Some(symbol) = chars.peek().copied() {
                if !symbol.is_ascii_digit() {
                    break;
                }
                digits.push(symbol);
                chars.next();
            }

            let length: usize = digits.parse().map_err(|_| malformed())?;
            if length == 0 {
                return Err(malformed());
            }

            let symbol = chars.next().ok_or_else(malformed)?;
            let kind = SegmentKind::from_symbol(symbol).ok_or_else(malformed)?;
            let occurrence = occurrences.entry(symbol).or_insert(0);
            *occurrence += 1;

            segments.push(Segment {
                kind,
                length,
                occurrence: *occurrence,
            });
        }

        Ok(segments)
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Minimum read length required by the structure. Trailing ignored bases
    /// may be truncated by the sequencer without losing information.
    pub fn min_length(&self) -> usize {
        self.expanded.trim_end_matches('X').len()
    }

    /// umi_tools `bc-pattern` regex extracting barcode and UMI bases.
    ///
    /// Each captured segment matches 1 to `length` bases (indels in the UP
    /// primer can shift everything downstream) and a trailing `discard`
    /// group absorbs anything past the nominal structure.
    pub fn umi_tools_regex(&self) -> String {
        let mut pattern = String::from("^");
        let mut discards = 0;

        for segment in &self.segments {
            match segment.kind.group_name() {
                None => pattern.push_str(&format!(".{{1,{}}}", segment.length)),
                Some(name) => {
                    if segment.kind == SegmentKind::Discard {
                        discards += 1;
                    }
                    pattern.push_str(&format!(
                        "(?P<{}_{}>.{{1,{}}})",
                        name, segment.occurrence, segment.length
                    ));
                }
            }
        }

        pattern.push_str(&format!("(?P<discard_{}>.*)$", discards + 1));
        pattern
    }
}

impl FromStr for ReadStructure {
    type Err = StructureError;

    fn from_str(structure: &str) -> Result<Self, Self::Err> {
        ReadStructure::new(structure)
    }
}
