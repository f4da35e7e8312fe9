//! wavemix: an analog model of combined oscillator waveforms and a
//! stochastic local search that fits its parameters to measured chip output.
//!
//! When two or more of a sound chip's digital waveform generators (triangle,
//! sawtooth, pulse) are selected at once, their outputs are shorted together
//! on silicon and the result is neither waveform. This crate models that
//! hybrid output as twelve analog bit lines with distance-decaying
//! cross-talk, quantized back to an 8-bit sample.
//!
//! # Modules
//!
//! - [`params`]: the five-parameter model vector
//! - [`waveform`]: combination codes and the measured reference table
//! - [`simulator`]: coupling kernel and per-counter simulation
//! - [`scorer`]: Hamming-distance scoring against a reference table
//! - [`perturb`]: candidate proposal strategies
//! - [`optimizer`]: the accept-if-not-worse search loop
//!
//! # Example
//!
//! ```rust
//! use wavemix::{render_table, score, CombinationCode, ParameterVector};
//!
//! let code = CombinationCode::TrianglePulse;
//! let params = ParameterVector::default_for(code);
//!
//! // A table rendered from the model scores a perfect zero against itself.
//! let table = render_table(code, &params);
//! assert_eq!(score(code, &params, &table), 0);
//! ```

pub mod error;
pub mod optimizer;
pub mod params;
pub mod perturb;
pub mod scorer;
pub mod simulator;
pub mod waveform;

pub use error::ModelError;
pub use optimizer::{Improvement, ImprovementSink, Optimizer, SearchControl, SearchState};
pub use params::{Parameter, ParameterVector};
pub use perturb::{DiscreteJitter, JointJitter, Perturbation, PerturbationPolicy};
pub use scorer::{hamming, score, score_bounded, trace, Scorer, TraceRow};
pub use simulator::{render_table, simulate, BitLevels, CouplingKernel, WaveformSimulator};
pub use waveform::{CombinationCode, ReferenceTable, COUNTER_VALUES, MAX_SCORE};
