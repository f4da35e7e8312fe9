//! Analog bit-line model of the combined waveform output.
//!
//! The oscillator counter drives twelve bit lines. Selecting several
//! waveforms shorts their drivers together, so each line is pulled towards a
//! weighted average of its neighbours before the DAC samples the top eight.
//! The model runs, per counter value:
//!
//! 1. sawtooth levels straight from the counter bits, MSB scaled by `top_bit`
//! 2. triangle folding (XOR with the MSB) when triangle is present without
//!    sawtooth
//! 3. sawtooth/triangle blending by `stmix` when both are present
//! 4. one cross-talk pass with the [`CouplingKernel`], pulse acting as a
//!    thirteenth line
//! 5. thresholding lines 4..11 against `bias`
//!
//! All arithmetic is `f32`. Non-finite kernel weights (e.g. `distance <= -1`)
//! are not clamped: they propagate as NaN/Inf, and since `NaN > bias` is
//! false the affected lines read as 0.

use crate::params::ParameterVector;
use crate::waveform::{CombinationCode, ReferenceTable, COUNTER_VALUES};

/// Number of oscillator bit lines.
pub const BIT_LINES: usize = 12;

/// Bit line index of the pulse input in kernel offset terms.
const PULSE_LINE: isize = BIT_LINES as isize;

const KERNEL_TAPS: usize = 2 * BIT_LINES + 1;

/// Analog level of each bit line, index 0 = counter LSB.
pub type BitLevels = [f32; BIT_LINES];

// ---------------------------------------------------------------------------
// Coupling kernel
// ---------------------------------------------------------------------------

/// Cross-talk weight by bit offset, `1 / (1 + d² · distance)` for d in -12..=12.
///
/// The centre tap is always 1, so an infinite `distance` leaves each line
/// coupled only to itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingKernel {
    weights: [f32; KERNEL_TAPS],
}

impl CouplingKernel {
    pub fn new(distance: f32) -> Self {
        let mut weights = [0.0f32; KERNEL_TAPS];
        weights[BIT_LINES] = 1.0;
        for d in 1..=BIT_LINES {
            let w = 1.0f32 / (1.0f32 + (d * d) as f32 * distance);
            weights[BIT_LINES - d] = w;
            weights[BIT_LINES + d] = w;
        }
        Self { weights }
    }

    /// Weight for a signed bit offset in -12..=12.
    #[inline]
    pub fn weight(&self, offset: isize) -> f32 {
        self.weights[(offset + BIT_LINES as isize) as usize]
    }

    pub fn weights(&self) -> &[f32; KERNEL_TAPS] {
        &self.weights
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Simulator for one (combination, parameter vector) pair.
///
/// The kernel is derived once from `distance` at construction; evaluating a
/// counter value is then a pure function with no state.
#[derive(Debug, Clone)]
pub struct WaveformSimulator {
    code: CombinationCode,
    params: ParameterVector,
    kernel: CouplingKernel,
}

impl WaveformSimulator {
    pub fn new(code: CombinationCode, params: ParameterVector) -> Self {
        Self {
            code,
            params,
            kernel: CouplingKernel::new(params.distance),
        }
    }

    pub fn kernel(&self) -> &CouplingKernel {
        &self.kernel
    }

    /// Bit line levels after waveform combination, before cross-talk.
    ///
    /// Only the low 12 bits of `counter` are used.
    pub fn input_levels(&self, counter: u16) -> BitLevels {
        let j = counter as usize & (COUNTER_VALUES - 1);
        let mut levels: BitLevels = [0.0; BIT_LINES];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = if j & (1 << i) != 0 { 1.0 } else { 0.0 };
        }
        levels[BIT_LINES - 1] *= self.params.top_bit;

        if self.code.folds_triangle() {
            let top = j & (1 << (BIT_LINES - 1)) != 0;
            for i in (1..BIT_LINES).rev() {
                levels[i] = if top {
                    1.0 - levels[i - 1]
                } else {
                    levels[i - 1]
                };
            }
            levels[0] = 0.0;
        }

        if self.code.blends_saw_triangle() {
            let stmix = self.params.stmix;
            for i in (1..BIT_LINES).rev() {
                levels[i] = levels[i - 1] * (1.0 - stmix) + levels[i] * stmix;
            }
            levels[0] *= stmix;
        }

        levels
    }

    /// One cross-talk pass. Each line moves halfway towards the
    /// kernel-weighted average of all lines (plus pulse, when present).
    pub fn mix(&self, levels: &BitLevels) -> BitLevels {
        let mut mixed: BitLevels = [0.0; BIT_LINES];
        for (sb, out) in mixed.iter_mut().enumerate() {
            let mut n = 0.0f32;
            let mut avg = 0.0f32;
            for (cb, &level) in levels.iter().enumerate() {
                let weight = self.kernel.weight(sb as isize - cb as isize);
                avg += level * weight;
                n += weight;
            }
            if self.code.has_pulse() {
                let weight = self.kernel.weight(sb as isize - PULSE_LINE);
                avg += self.params.pulse_strength * weight;
                n += weight;
            }
            *out = (levels[sb] + avg / n) * 0.5;
        }
        mixed
    }

    /// Bit line levels after cross-talk.
    pub fn levels(&self, counter: u16) -> BitLevels {
        self.mix(&self.input_levels(counter))
    }

    /// Threshold lines 4..11 into an output byte.
    #[inline]
    pub fn quantize(&self, levels: &BitLevels) -> u8 {
        let mut result = 0u8;
        for cb in 0..8 {
            if levels[4 + cb] > self.params.bias {
                result |= 1 << cb;
            }
        }
        result
    }

    /// Simulated output byte for a counter value.
    #[inline]
    pub fn sample(&self, counter: u16) -> u8 {
        self.quantize(&self.levels(counter))
    }

    /// Soft reconstruction of the 12-bit analog output, on the 8-bit scale.
    ///
    /// Each line contributes its distance above `bias`, steeply clipped to
    /// [0, 1]. Diagnostic only.
    pub fn analog(&self, levels: &BitLevels) -> f32 {
        let mut value = 0.0f32;
        for (i, &level) in levels.iter().enumerate() {
            let bit = ((level - self.params.bias) * 512.0 + 0.5).clamp(0.0, 1.0);
            value += bit * (1u32 << i) as f32;
        }
        value / 16.0
    }
}

/// Simulated output byte for one counter value.
pub fn simulate(code: CombinationCode, params: &ParameterVector, counter: u16) -> u8 {
    WaveformSimulator::new(code, *params).sample(counter)
}

/// Model output for every counter value, as a reference table.
pub fn render_table(code: CombinationCode, params: &ParameterVector) -> ReferenceTable {
    let sim = WaveformSimulator::new(code, *params);
    let mut samples = Box::new([0u8; COUNTER_VALUES]);
    for (j, sample) in samples.iter_mut().enumerate() {
        *sample = sim.sample(j as u16);
    }
    ReferenceTable::from(samples)
}
