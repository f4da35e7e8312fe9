//! Reading measured tables from the sampling CSV files.
//!
//! Each combination has one file, `WAVE{code:X}.CSV`, with 4096 lines. A line
//! holds one comma-separated output byte per sampled chip; the chip letter
//! picks the column (`A` is the first).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use wavemix::{CombinationCode, ModelError, ReferenceTable};

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read reference file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid chip '{0}' (expected a single letter A-Z)")]
    InvalidChip(String),
    #[error("Line {line} has {columns} columns, chip {chip} needs column {}", .chip.column() + 1)]
    MissingColumn {
        line: usize,
        chip: ChipId,
        columns: usize,
    },
    #[error("Line {line}: cannot parse '{cell}' as an integer")]
    BadCell { line: usize, cell: String },
    #[error("Invalid reference table: {0}")]
    Table(#[from] ModelError),
}

/// Letter naming one sampled chip, `A` through `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChipId(char);

impl ChipId {
    pub fn new(letter: char) -> Result<Self, ReferenceError> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Self(upper))
        } else {
            Err(ReferenceError::InvalidChip(letter.to_string()))
        }
    }

    pub fn letter(self) -> char {
        self.0
    }

    /// Zero-based CSV column.
    pub fn column(self) -> usize {
        (self.letter() as u8 - b'A') as usize
    }
}

impl FromStr for ChipId {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::new(letter),
            _ => Err(ReferenceError::InvalidChip(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChipId {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChipId> for String {
    fn from(chip: ChipId) -> Self {
        chip.letter().to_string()
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// `WAVE3.CSV`, `WAVE5.CSV`, ...
pub fn data_file_name(code: CombinationCode) -> String {
    format!("WAVE{:X}.CSV", code.bits())
}

pub fn data_path(data_dir: impl AsRef<Path>, code: CombinationCode) -> PathBuf {
    data_dir.as_ref().join(data_file_name(code))
}

/// Extract one chip's column from CSV text.
///
/// Blank lines are skipped and cells are trimmed. The result must have
/// exactly 4096 rows of values in `0..=255`.
pub fn parse_table(text: &str, chip: ChipId) -> Result<ReferenceTable, ReferenceError> {
    let column = chip.column();
    let mut samples = Vec::with_capacity(wavemix::COUNTER_VALUES);

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let cells: Vec<&str> = line.split(',').collect();
        let cell = cells
            .get(column)
            .ok_or(ReferenceError::MissingColumn {
                line: line_no,
                chip,
                columns: cells.len(),
            })?
            .trim();
        let value = cell.parse::<i64>().map_err(|_| ReferenceError::BadCell {
            line: line_no,
            cell: cell.to_string(),
        })?;
        samples.push(value);
    }

    Ok(ReferenceTable::from_samples(&samples)?)
}

/// Load the measured table for `code` and `chip` from `data_dir`.
pub fn load_table(
    data_dir: impl AsRef<Path>,
    code: CombinationCode,
    chip: ChipId,
) -> Result<ReferenceTable, ReferenceError> {
    let path = data_path(data_dir, code);
    let text = std::fs::read_to_string(&path)?;
    let table = parse_table(&text, chip)?;
    tracing::info!(path = %path.display(), %chip, code = code.bits(), "loaded reference table");
    Ok(table)
}

/// Write a table as a one-column CSV, readable back as chip `A`.
pub fn write_csv(path: impl AsRef<Path>, table: &ReferenceTable) -> Result<(), std::io::Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = String::with_capacity(table.as_slice().len() * 4);
    for sample in table.iter() {
        out.push_str(&sample.to_string());
        out.push('\n');
    }
    std::fs::write(path, out)
}
