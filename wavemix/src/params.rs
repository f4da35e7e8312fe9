//! The five model parameters.

use crate::waveform::CombinationCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter vector of the combined-waveform model.
///
/// All fields are single precision: fits recorded against hardware were
/// produced with `f32` arithmetic, and reproducing them bit-for-bit requires
/// the same rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    /// Quantization threshold applied to each mixed bit line, roughly (0, 1).
    pub bias: f32,
    /// Level of the pulse input when the combination includes pulse.
    pub pulse_strength: f32,
    /// Attenuation of the counter MSB before mixing.
    pub top_bit: f32,
    /// Decay rate of the cross-bit coupling kernel; smaller couples wider.
    pub distance: f32,
    /// Sawtooth/triangle blend, only used when both are combined.
    pub stmix: f32,
}

/// Names the five fields so the search can iterate them without reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Bias,
    PulseStrength,
    TopBit,
    Distance,
    Stmix,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::Bias,
        Parameter::PulseStrength,
        Parameter::TopBit,
        Parameter::Distance,
        Parameter::Stmix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Bias => "bias",
            Parameter::PulseStrength => "pulse_strength",
            Parameter::TopBit => "top_bit",
            Parameter::Distance => "distance",
            Parameter::Stmix => "stmix",
        }
    }
}

impl ParameterVector {
    pub fn new(bias: f32, pulse_strength: f32, top_bit: f32, distance: f32, stmix: f32) -> Self {
        Self {
            bias,
            pulse_strength,
            top_bit,
            distance,
            stmix,
        }
    }

    /// Starting point when no hand-curated seed exists for a combination.
    ///
    /// Parameters the combination never reads start at zero, where
    /// multiplicative jitter keeps them.
    pub fn default_for(code: CombinationCode) -> Self {
        Self {
            bias: 0.95,
            pulse_strength: if code.has_pulse() { 1.0 } else { 0.0 },
            top_bit: 1.0,
            distance: 1.0,
            stmix: if code.blends_saw_triangle() { 0.5 } else { 0.0 },
        }
    }

    #[inline]
    pub fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Bias => self.bias,
            Parameter::PulseStrength => self.pulse_strength,
            Parameter::TopBit => self.top_bit,
            Parameter::Distance => self.distance,
            Parameter::Stmix => self.stmix,
        }
    }

    #[inline]
    pub fn set(&mut self, parameter: Parameter, value: f32) {
        match parameter {
            Parameter::Bias => self.bias = value,
            Parameter::PulseStrength => self.pulse_strength = value,
            Parameter::TopBit => self.top_bit = value,
            Parameter::Distance => self.distance = value,
            Parameter::Stmix => self.stmix = value,
        }
    }

    /// `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> [(&'static str, f32); 5] {
        Parameter::ALL.map(|p| (p.name(), self.get(p)))
    }

    pub fn is_finite(&self) -> bool {
        Parameter::ALL.iter().all(|&p| self.get(p).is_finite())
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.entries() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{name} = {value:?}")?;
        }
        Ok(())
    }
}
