//! Candidate proposal strategies for the local search.
//!
//! Two policies are provided:
//!
//! - [`DiscreteJitter`]: each parameter independently has a coin-flip chance of
//!   being scaled by a factor in `[0.5, 1) ∪ (1, 2]`; the draw is repeated
//!   until something actually changed.
//! - [`JointJitter`]: all five parameters move together by a small continuous
//!   factor around 1 whose spread is itself random.
//!
//! The random source is passed in, so a seeded RNG reproduces a run exactly.

use crate::params::{Parameter, ParameterVector};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Produces a candidate from the current best.
pub trait Perturbation: Send + Sync {
    fn propose(&self, current: &ParameterVector, rng: &mut dyn RngCore) -> ParameterVector;

    fn name(&self) -> &'static str;
}

/// Per-parameter multiplicative jitter with resampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscreteJitter;

impl DiscreteJitter {
    /// Factor in `[0.5, 1)` or its reciprocal in `(1, 2]`, equally likely.
    fn factor(rng: &mut dyn RngCore) -> f32 {
        let t = 1.0 - rng.gen::<f64>() as f32 * 0.5;
        if rng.gen::<f64>() > 0.5 {
            1.0 / t
        } else {
            t
        }
    }

    /// Whether any draw can make `value` differ after scaling and clamping.
    fn can_move(parameter: Parameter, value: f32) -> bool {
        if parameter == Parameter::Stmix && value > 1.0 {
            return true;
        }
        value != 0.0 && value.is_finite()
    }
}

impl Perturbation for DiscreteJitter {
    fn propose(&self, current: &ParameterVector, rng: &mut dyn RngCore) -> ParameterVector {
        if !Parameter::ALL
            .iter()
            .any(|&p| Self::can_move(p, current.get(p)))
        {
            return *current;
        }

        loop {
            let mut candidate = *current;
            let mut changed = false;
            for parameter in Parameter::ALL {
                let old = current.get(parameter);
                let mut new = old;
                if rng.gen::<f64>() > 0.5 {
                    new *= Self::factor(rng);
                    if parameter == Parameter::Stmix && new > 1.0 {
                        new = 1.0;
                    }
                }
                candidate.set(parameter, new);
                changed |= old.to_bits() != new.to_bits();
            }
            if changed {
                return candidate;
            }
        }
    }

    fn name(&self) -> &'static str {
        "discrete"
    }
}

/// Joint continuous jitter: one random spread, five independent offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct JointJitter;

impl JointJitter {
    /// Upper bound of the shared spread.
    pub const MAX_SPREAD: f32 = 0.25;
}

impl Perturbation for JointJitter {
    fn propose(&self, current: &ParameterVector, rng: &mut dyn RngCore) -> ParameterVector {
        let spread = rng.gen::<f64>() as f32 * Self::MAX_SPREAD;
        let mut candidate = *current;
        for parameter in Parameter::ALL {
            let offset = rng.gen::<f64>() as f32 - 0.5;
            candidate.set(parameter, current.get(parameter) * (1.0 + spread * offset));
        }
        candidate
    }

    fn name(&self) -> &'static str {
        "joint"
    }
}

/// Selectable policy, as named on the command line and in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationPolicy {
    #[default]
    Discrete,
    Joint,
}

impl PerturbationPolicy {
    pub fn name(self) -> &'static str {
        match self {
            PerturbationPolicy::Discrete => "discrete",
            PerturbationPolicy::Joint => "joint",
        }
    }

    pub fn strategy(self) -> Box<dyn Perturbation> {
        match self {
            PerturbationPolicy::Discrete => Box::new(DiscreteJitter),
            PerturbationPolicy::Joint => Box::new(JointJitter),
        }
    }
}

impl FromStr for PerturbationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discrete" => Ok(PerturbationPolicy::Discrete),
            "joint" => Ok(PerturbationPolicy::Joint),
            other => Err(format!(
                "Unknown perturbation policy '{other}' (expected discrete or joint)"
            )),
        }
    }
}

impl fmt::Display for PerturbationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
