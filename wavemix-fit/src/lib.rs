//! # wavemix-fit
//!
//! Tooling around the [`wavemix`] model: loads measured combined-waveform
//! tables captured from real chips, picks a starting vector from a seed
//! catalog, runs the search and reports every improvement.
//!
//! ## Data Files
//!
//! Measurements live in one CSV per combination, `WAVE3.CSV`, `WAVE5.CSV`,
//! `WAVE6.CSV` and `WAVE7.CSV`, each with 4096 lines and one column per chip.
//! Chips are named by letter, `A` being the first column.
//!
//! ```rust,no_run
//! use wavemix::CombinationCode;
//! use wavemix_fit::reference::{load_table, ChipId};
//!
//! let chip: ChipId = "D".parse().unwrap();
//! let table = load_table("sidwaves", CombinationCode::TriangleSawtooth, chip).unwrap();
//! assert_eq!(table.as_slice().len(), 4096);
//! ```
//!
//! ## Fitting
//!
//! ```rust,no_run
//! use wavemix::{CombinationCode, PerturbationPolicy};
//! use wavemix_fit::runner::{FitRunner, RunnerConfig};
//!
//! let config = RunnerConfig {
//!     policy: PerturbationPolicy::Joint,
//!     rng_seed: Some(42),
//!     max_iterations: Some(50_000),
//!     jobs: 4,
//!     ..RunnerConfig::default()
//! };
//! let runner = FitRunner::new(config).unwrap();
//! let report = runner.fit(CombinationCode::SawtoothPulse, "G".parse().unwrap()).unwrap();
//! report.print_summary();
//! report.save_json("reports/G-6.json").unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`reference`]: chip ids and CSV table loading
//! - [`config`]: the YAML seed catalog
//! - [`report`]: improvement formats, fit reports, catalog listing
//! - [`runner`]: wiring loader, catalog and optimizer together

pub mod config;
pub mod reference;
pub mod report;
pub mod runner;

pub use config::{ChipSeeds, ConfigError, SeedCatalog, SeedEntry};
pub use reference::{ChipId, ReferenceError};
pub use report::{FitReport, ImprovementLog, ReportFormat};
pub use runner::{FitRunner, ParameterOverrides, RunnerConfig, RunnerError, ScoreOutcome};
