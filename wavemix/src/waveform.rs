//! Combination codes and measured reference tables.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Number of oscillator counter values (12-bit accumulator).
pub const COUNTER_VALUES: usize = 4096;

/// Worst possible score: every bit of every sample wrong.
pub const MAX_SCORE: u32 = 8 * COUNTER_VALUES as u32;

// ---------------------------------------------------------------------------
// Combination code
// ---------------------------------------------------------------------------

/// Which waveform generators are shorted together.
///
/// The discriminant is the waveform selector nibble as written to the chip:
/// bit 0 = triangle, bit 1 = sawtooth, bit 2 = pulse. Only combinations of
/// two or more analog waveforms are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum CombinationCode {
    /// Sawtooth + triangle.
    TriangleSawtooth = 3,
    /// Pulse + triangle.
    TrianglePulse = 5,
    /// Pulse + sawtooth.
    SawtoothPulse = 6,
    /// Pulse + sawtooth + triangle.
    TriangleSawtoothPulse = 7,
}

impl CombinationCode {
    pub const ALL: [CombinationCode; 4] = [
        CombinationCode::TriangleSawtooth,
        CombinationCode::TrianglePulse,
        CombinationCode::SawtoothPulse,
        CombinationCode::TriangleSawtoothPulse,
    ];

    /// Raw selector value.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Triangle folds the counter around its MSB (triangle without sawtooth).
    #[inline]
    pub fn folds_triangle(self) -> bool {
        self.bits() & 3 == 1
    }

    /// Sawtooth and triangle drive the bit lines together and are blended.
    #[inline]
    pub fn blends_saw_triangle(self) -> bool {
        self.bits() & 3 == 3
    }

    /// Pulse is present and acts as a thirteenth input line.
    #[inline]
    pub fn has_pulse(self) -> bool {
        self.bits() > 4
    }

    /// Short waveform label, e.g. `PST`.
    pub fn label(self) -> &'static str {
        match self {
            CombinationCode::TriangleSawtooth => "ST",
            CombinationCode::TrianglePulse => "PT",
            CombinationCode::SawtoothPulse => "PS",
            CombinationCode::TriangleSawtoothPulse => "PST",
        }
    }
}

impl TryFrom<u8> for CombinationCode {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(CombinationCode::TriangleSawtooth),
            5 => Ok(CombinationCode::TrianglePulse),
            6 => Ok(CombinationCode::SawtoothPulse),
            7 => Ok(CombinationCode::TriangleSawtoothPulse),
            other => Err(ModelError::InvalidCombination(other)),
        }
    }
}

impl From<CombinationCode> for u8 {
    fn from(code: CombinationCode) -> Self {
        code.bits()
    }
}

impl FromStr for CombinationCode {
    type Err = ModelError;

    /// Accepts the numeric selector (`3`, `5`, `6`, `7`) or the label
    /// (`st`, `pt`, `ps`, `pst`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<u8>() {
            return Self::try_from(value);
        }
        match s.to_ascii_uppercase().as_str() {
            "ST" | "TS" => Ok(CombinationCode::TriangleSawtooth),
            "PT" | "TP" => Ok(CombinationCode::TrianglePulse),
            "PS" | "SP" => Ok(CombinationCode::SawtoothPulse),
            "PST" | "PTS" | "STP" => Ok(CombinationCode::TriangleSawtoothPulse),
            _ => Err(ModelError::UnknownCombination(s.to_string())),
        }
    }
}

impl fmt::Display for CombinationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.bits(), self.label())
    }
}

// ---------------------------------------------------------------------------
// Reference table
// ---------------------------------------------------------------------------

/// Measured output byte for every counter value, captured from one chip.
///
/// Always exactly [`COUNTER_VALUES`] entries. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    samples: Box<[u8]>,
}

impl ReferenceTable {
    /// Build a table from raw integers, checking count and byte range.
    pub fn from_samples(samples: &[i64]) -> Result<Self, ModelError> {
        if samples.len() != COUNTER_VALUES {
            return Err(ModelError::WrongRowCount {
                expected: COUNTER_VALUES,
                found: samples.len(),
            });
        }
        let bytes = samples
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                u8::try_from(value).map_err(|_| ModelError::SampleOutOfRange { row, value })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(Self {
            samples: bytes.into_boxed_slice(),
        })
    }

    /// Build a table from bytes, checking only the count.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ModelError> {
        if bytes.len() != COUNTER_VALUES {
            return Err(ModelError::WrongRowCount {
                expected: COUNTER_VALUES,
                found: bytes.len(),
            });
        }
        Ok(Self {
            samples: bytes.into_boxed_slice(),
        })
    }

    /// Measured byte for a counter value.
    #[inline]
    pub fn get(&self, counter: usize) -> u8 {
        self.samples[counter]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.samples.iter().copied()
    }
}

impl From<Box<[u8; COUNTER_VALUES]>> for ReferenceTable {
    fn from(samples: Box<[u8; COUNTER_VALUES]>) -> Self {
        Self { samples }
    }
}

impl Index<usize> for ReferenceTable {
    type Output = u8;

    fn index(&self, counter: usize) -> &u8 {
        &self.samples[counter]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_four_combinations_are_accepted() {
        for value in 0u8..=15 {
            let parsed = CombinationCode::try_from(value);
            if matches!(value, 3 | 5 | 6 | 7) {
                assert_eq!(parsed.map(u8::from), Ok(value));
            } else {
                assert_eq!(parsed, Err(ModelError::InvalidCombination(value)));
            }
        }
    }

    #[test]
    fn predicates_follow_selector_bits() {
        use CombinationCode::*;
        assert!(TrianglePulse.folds_triangle());
        assert!(!TriangleSawtooth.folds_triangle());
        assert!(!SawtoothPulse.folds_triangle());
        assert!(!TriangleSawtoothPulse.folds_triangle());

        assert!(TriangleSawtooth.blends_saw_triangle());
        assert!(TriangleSawtoothPulse.blends_saw_triangle());
        assert!(!TrianglePulse.blends_saw_triangle());

        assert!(!TriangleSawtooth.has_pulse());
        assert!(TrianglePulse.has_pulse());
        assert!(SawtoothPulse.has_pulse());
        assert!(TriangleSawtoothPulse.has_pulse());
    }

    #[test]
    fn parses_numbers_and_labels() {
        assert_eq!("7".parse::<CombinationCode>(), Ok(CombinationCode::TriangleSawtoothPulse));
        assert_eq!("ps".parse::<CombinationCode>(), Ok(CombinationCode::SawtoothPulse));
        assert_eq!(" ST ".parse::<CombinationCode>(), Ok(CombinationCode::TriangleSawtooth));
        assert_eq!(
            "4".parse::<CombinationCode>(),
            Err(ModelError::InvalidCombination(4))
        );
        assert!(matches!(
            "noise".parse::<CombinationCode>(),
            Err(ModelError::UnknownCombination(_))
        ));
    }

    #[test]
    fn table_rejects_wrong_length() {
        let err = ReferenceTable::from_samples(&[0; 4095]).unwrap_err();
        assert_eq!(
            err,
            ModelError::WrongRowCount {
                expected: 4096,
                found: 4095
            }
        );
        assert!(ReferenceTable::from_bytes(vec![0; 4097]).is_err());
    }

    #[test]
    fn table_rejects_out_of_range_bytes() {
        let mut samples = vec![0i64; COUNTER_VALUES];
        samples[17] = 256;
        assert_eq!(
            ReferenceTable::from_samples(&samples),
            Err(ModelError::SampleOutOfRange { row: 17, value: 256 })
        );
        samples[17] = -1;
        assert_eq!(
            ReferenceTable::from_samples(&samples),
            Err(ModelError::SampleOutOfRange { row: 17, value: -1 })
        );
    }

    #[test]
    fn table_indexing() {
        let samples: Vec<i64> = (0..COUNTER_VALUES as i64).map(|j| j >> 4).collect();
        let table = ReferenceTable::from_samples(&samples).unwrap();
        assert_eq!(table[0], 0);
        assert_eq!(table.get(4095), 255);
        assert_eq!(table.iter().count(), COUNTER_VALUES);
    }
}
