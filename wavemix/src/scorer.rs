//! Mismatch scoring against a measured table.
//!
//! The score is the total number of differing output bits over all 4096
//! counter values, so it lies in `0..=MAX_SCORE` and 0 means a perfect fit.

use crate::params::ParameterVector;
use crate::simulator::WaveformSimulator;
use crate::waveform::{CombinationCode, ReferenceTable, COUNTER_VALUES};
use serde::{Deserialize, Serialize};

/// Number of differing bits between two bytes.
#[inline]
pub fn hamming(a: u8, b: u8) -> u32 {
    (a ^ b).count_ones()
}

/// Scores parameter vectors for one combination against one table.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    code: CombinationCode,
    table: &'a ReferenceTable,
}

impl<'a> Scorer<'a> {
    pub fn new(code: CombinationCode, table: &'a ReferenceTable) -> Self {
        Self { code, table }
    }

    /// Exact total mismatch.
    pub fn score(&self, params: &ParameterVector) -> u32 {
        self.sweep(params, None)
    }

    /// Mismatch with early exit.
    ///
    /// Returns the exact score when it is `<= bound`; otherwise some value
    /// `> bound` (the partial sum at the point it crossed).
    pub fn score_within(&self, params: &ParameterVector, bound: u32) -> u32 {
        self.sweep(params, Some(bound))
    }

    fn sweep(&self, params: &ParameterVector, bound: Option<u32>) -> u32 {
        let sim = WaveformSimulator::new(self.code, *params);
        let mut total = 0u32;
        for j in 0..COUNTER_VALUES {
            total += hamming(sim.sample(j as u16), self.table.get(j));
            if let Some(bound) = bound {
                if total > bound {
                    return total;
                }
            }
        }
        total
    }

    /// Per-counter comparison rows. Does not affect any score.
    pub fn trace(&self, params: &ParameterVector) -> Vec<TraceRow> {
        let sim = WaveformSimulator::new(self.code, *params);
        (0..COUNTER_VALUES)
            .map(|j| {
                let levels = sim.levels(j as u16);
                TraceRow {
                    counter: j as u16,
                    reference: self.table.get(j),
                    simulated: sim.quantize(&levels),
                    analog: sim.analog(&levels),
                }
            })
            .collect()
    }
}

/// One line of a diagnostic dump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub counter: u16,
    pub reference: u8,
    pub simulated: u8,
    /// Soft 12-bit reconstruction on the 8-bit scale, see
    /// [`WaveformSimulator::analog`].
    pub analog: f32,
}

impl TraceRow {
    pub fn mismatch(&self) -> u32 {
        hamming(self.simulated, self.reference)
    }
}

/// Exact total mismatch of `params` against `table`.
pub fn score(code: CombinationCode, params: &ParameterVector, table: &ReferenceTable) -> u32 {
    Scorer::new(code, table).score(params)
}

/// Mismatch that may stop early once it exceeds `bound`.
pub fn score_bounded(
    code: CombinationCode,
    params: &ParameterVector,
    table: &ReferenceTable,
    bound: u32,
) -> u32 {
    Scorer::new(code, table).score_within(params, bound)
}

/// Per-counter `(counter, reference, simulated, analog)` rows.
pub fn trace(code: CombinationCode, params: &ParameterVector, table: &ReferenceTable) -> Vec<TraceRow> {
    Scorer::new(code, table).trace(params)
}
