use thiserror::Error;

/// Errors raised at the boundary of the model: bad selectors and bad tables.
///
/// Nothing inside the simulator or the search loop fails; these are all
/// rejected before any scoring happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid combination code {0} (expected 3, 5, 6 or 7)")]
    InvalidCombination(u8),
    #[error("Unknown combination name '{0}'")]
    UnknownCombination(String),
    #[error("Reference table has {found} rows, expected {expected}")]
    WrongRowCount { expected: usize, found: usize },
    #[error("Reference sample {value} at row {row} is outside 0..=255")]
    SampleOutOfRange { row: usize, value: i64 },
}
