//! Fit orchestration: reference loading, seed selection, search, report.
//!
//! ```rust,ignore
//! use wavemix::{CombinationCode, SearchControl};
//! use wavemix_fit::runner::{FitRunner, RunnerConfig};
//!
//! let config = RunnerConfig {
//!     data_dir: "sidwaves".into(),
//!     rng_seed: Some(1),
//!     max_iterations: Some(10_000),
//!     ..RunnerConfig::default()
//! };
//! let runner = FitRunner::new(config).unwrap();
//! let report = runner.fit(CombinationCode::TriangleSawtoothPulse, "E".parse().unwrap()).unwrap();
//! println!("best score {}", report.best_score);
//! ```

use crate::config::{ConfigError, SeedCatalog};
use crate::reference::{self, ChipId, ReferenceError};
use crate::report::{FitReport, ImprovementLog, ReportFormat};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wavemix::{
    render_table, CombinationCode, ImprovementSink, Optimizer, ParameterVector,
    PerturbationPolicy, ReferenceTable, Scorer, SearchControl, TraceRow,
};

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),
    #[error("Seed catalog error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Fit runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory holding the `WAVE*.CSV` files.
    pub data_dir: PathBuf,
    /// Seed catalog YAML; the built-in catalog when absent or missing.
    pub seeds_path: Option<PathBuf>,
    pub policy: PerturbationPolicy,
    /// Fixed RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Stop after this many candidates; search forever when `None`.
    pub max_iterations: Option<u64>,
    /// Worker threads; 1 runs the sequential search.
    pub jobs: usize,
    pub format: ReportFormat,
    /// Print improvements as they arrive.
    pub echo: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("sidwaves"),
            seeds_path: None,
            policy: PerturbationPolicy::Discrete,
            rng_seed: None,
            max_iterations: None,
            jobs: 1,
            format: ReportFormat::Text,
            echo: true,
        }
    }
}

/// Explicit values that replace fields of the seed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterOverrides {
    pub bias: Option<f32>,
    pub pulse_strength: Option<f32>,
    pub top_bit: Option<f32>,
    pub distance: Option<f32>,
    pub stmix: Option<f32>,
}

impl ParameterOverrides {
    pub fn apply(&self, base: ParameterVector) -> ParameterVector {
        ParameterVector {
            bias: self.bias.unwrap_or(base.bias),
            pulse_strength: self.pulse_strength.unwrap_or(base.pulse_strength),
            top_bit: self.top_bit.unwrap_or(base.top_bit),
            distance: self.distance.unwrap_or(base.distance),
            stmix: self.stmix.unwrap_or(base.stmix),
        }
    }
}

/// Result of a single scoring pass.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub params: ParameterVector,
    pub score: u32,
    /// Per-counter rows, when requested.
    pub trace: Option<Vec<TraceRow>>,
}

/// Main fit runner.
pub struct FitRunner {
    config: RunnerConfig,
    catalog: SeedCatalog,
}

impl FitRunner {
    /// Create a runner, loading the seed catalog named in `config`.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let catalog = SeedCatalog::load_or_builtin(config.seeds_path.as_deref())?;
        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: RunnerConfig, catalog: SeedCatalog) -> Self {
        Self { config, catalog }
    }

    /// Catalog seed for (chip, code), or the per-code default.
    pub fn seed_for(&self, chip: ChipId, code: CombinationCode) -> ParameterVector {
        match self.catalog.seed(chip, code) {
            Some(entry) => entry.params(),
            None => {
                tracing::warn!(%chip, code = code.bits(), "no seed in catalog, starting from defaults");
                ParameterVector::default_for(code)
            }
        }
    }

    pub fn load_reference(&self, code: CombinationCode, chip: ChipId) -> Result<ReferenceTable, RunnerError> {
        Ok(reference::load_table(&self.config.data_dir, code, chip)?)
    }

    /// Search control built from the configured iteration bound.
    pub fn control(&self) -> SearchControl {
        match self.config.max_iterations {
            Some(max) => SearchControl::with_max_iterations(max),
            None => SearchControl::unbounded(),
        }
    }

    /// Fit the model to one chip's table until the configured bound.
    pub fn fit(&self, code: CombinationCode, chip: ChipId) -> Result<FitReport, RunnerError> {
        self.fit_with(code, chip, &self.control())
    }

    /// Fit with an explicit control, e.g. one whose stop flag is shared.
    pub fn fit_with(
        &self,
        code: CombinationCode,
        chip: ChipId,
        control: &SearchControl,
    ) -> Result<FitReport, RunnerError> {
        let table = self.load_reference(code, chip)?;
        let seed = self.seed_for(chip, code);
        let mut optimizer = Optimizer::new(code, &table, seed, self.config.policy.strategy());

        let mut log = ImprovementLog::new(code, self.config.format, self.config.echo);
        log.initial(optimizer.initial_score(), &seed);

        let jobs = self.config.jobs.max(1);
        tracing::info!(
            %chip,
            code = code.bits(),
            policy = optimizer.strategy_name(),
            jobs,
            initial_score = optimizer.initial_score(),
            "starting search"
        );

        let state = if jobs == 1 {
            let mut rng = match self.config.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            optimizer.run(&mut rng, control, &mut log)
        } else {
            let base_seed = self.config.rng_seed.unwrap_or_else(rand::random);
            optimizer.run_parallel(jobs, base_seed, control, &mut log)
        };

        tracing::info!(
            iterations = optimizer.iterations(),
            best_score = state.score,
            "search finished"
        );

        Ok(FitReport::new(
            chip,
            code,
            self.config.policy,
            self.config.rng_seed,
            jobs,
            optimizer.iterations(),
            optimizer.initial_score(),
            state.best,
            state.score,
            log.into_improvements(),
        ))
    }

    /// Score the seed, with `overrides` applied, against the chip's table.
    pub fn score(
        &self,
        code: CombinationCode,
        chip: ChipId,
        overrides: &ParameterOverrides,
        with_trace: bool,
    ) -> Result<ScoreOutcome, RunnerError> {
        let table = self.load_reference(code, chip)?;
        let params = overrides.apply(self.seed_for(chip, code));
        let scorer = Scorer::new(code, &table);
        Ok(ScoreOutcome {
            params,
            score: scorer.score(&params),
            trace: with_trace.then(|| scorer.trace(&params)),
        })
    }

    /// Simulate the (overridden) seed and write it as a one-column CSV.
    pub fn render(
        &self,
        code: CombinationCode,
        chip: ChipId,
        overrides: &ParameterOverrides,
        out: &Path,
    ) -> Result<ReferenceTable, RunnerError> {
        let params = overrides.apply(self.seed_for(chip, code));
        let table = render_table(code, &params);
        reference::write_csv(out, &table)?;
        tracing::info!(path = %out.display(), "wrote simulated table");
        Ok(table)
    }
}
