//! Accept-if-not-worse stochastic local search.
//!
//! The optimizer holds the best parameter vector found so far and its exact
//! score. Each iteration proposes a candidate from the best, scores it with
//! the current best score as an early-exit bound, and adopts it when its
//! score is less than or equal to the best. Ties are accepted so the search
//! can drift across plateaus.
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use wavemix::{
//!     render_table, CombinationCode, Improvement, Optimizer, ParameterVector,
//!     PerturbationPolicy, SearchControl,
//! };
//!
//! let code = CombinationCode::SawtoothPulse;
//! let target = render_table(code, &ParameterVector::new(0.9, 2.2, 1.0, 0.1, 0.0));
//! let seed = ParameterVector::default_for(code);
//!
//! let mut optimizer = Optimizer::new(code, &target, seed, PerturbationPolicy::Discrete.strategy());
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut log = |i: &Improvement| println!("{} at iteration {}", i.score, i.iteration);
//! let state = optimizer.run(&mut rng, &SearchControl::with_max_iterations(200), &mut log);
//! assert!(state.score <= optimizer.initial_score());
//! ```

use crate::params::ParameterVector;
use crate::perturb::Perturbation;
use crate::scorer::Scorer;
use crate::waveform::{CombinationCode, ReferenceTable};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    /// 1-based iteration at which the candidate was proposed.
    pub iteration: u64,
    pub score: u32,
    pub params: ParameterVector,
}

/// Receives search progress.
pub trait ImprovementSink {
    /// Exact score of the seed, before any iteration.
    fn initial(&mut self, _score: u32, _params: &ParameterVector) {}

    fn improved(&mut self, improvement: &Improvement);
}

impl<F> ImprovementSink for F
where
    F: FnMut(&Improvement),
{
    fn improved(&mut self, improvement: &Improvement) {
        self(improvement)
    }
}

/// Current best vector and its exact score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub best: ParameterVector,
    pub score: u32,
}

/// When a search should end.
///
/// With no iteration bound and the stop flag never raised, [`Optimizer::run`]
/// does not return.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    max_iterations: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl SearchControl {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Self::default()
        }
    }

    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    /// Shared flag; storing `true` ends every search using this control.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn exhausted(&self, iterations: u64) -> bool {
        self.max_iterations.is_some_and(|max| iterations >= max)
    }
}

/// Best-so-far plus the sink, guarded together so commits and reports stay
/// in order.
struct Shared<'s, S> {
    state: SearchState,
    sink: &'s mut S,
}

/// Fits a [`ParameterVector`] to one reference table.
pub struct Optimizer<'a> {
    scorer: Scorer<'a>,
    strategy: Box<dyn Perturbation>,
    state: SearchState,
    initial_score: u32,
    iterations: u64,
}

impl<'a> Optimizer<'a> {
    /// Seed the search. The seed is scored exactly, without a bound.
    pub fn new(
        code: CombinationCode,
        table: &'a ReferenceTable,
        seed: ParameterVector,
        strategy: Box<dyn Perturbation>,
    ) -> Self {
        let scorer = Scorer::new(code, table);
        let score = scorer.score(&seed);
        Self {
            scorer,
            strategy,
            state: SearchState { best: seed, score },
            initial_score: score,
            iterations: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn initial_score(&self) -> u32 {
        self.initial_score
    }

    /// Candidates evaluated so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// One propose/score/accept round. Returns the candidate if adopted.
    pub fn step(&mut self, rng: &mut dyn RngCore) -> Option<Improvement> {
        self.iterations += 1;
        let candidate = self.strategy.propose(&self.state.best, rng);
        let score = self.scorer.score_within(&candidate, self.state.score);
        if score > self.state.score {
            return None;
        }
        self.state = SearchState {
            best: candidate,
            score,
        };
        tracing::debug!(iteration = self.iterations, score, "accepted {candidate}");
        Some(Improvement {
            iteration: self.iterations,
            score,
            params: candidate,
        })
    }

    /// Iterate until `control` says stop, reporting each adoption to `sink`.
    pub fn run(
        &mut self,
        rng: &mut dyn RngCore,
        control: &SearchControl,
        sink: &mut dyn ImprovementSink,
    ) -> SearchState {
        let start = self.iterations;
        while !control.should_stop() && !control.exhausted(self.iterations - start) {
            if let Some(improvement) = self.step(rng) {
                sink.improved(&improvement);
            }
        }
        self.state
    }

    /// Search on `jobs` threads sharing one best vector.
    ///
    /// Worker `k` draws from `StdRng::seed_from_u64(base_seed + k)` and
    /// proposes from a snapshot of the shared best. A candidate is committed
    /// only if its score is still `<=` the shared best when the lock is
    /// taken, so a stale result never replaces a better one. The iteration
    /// bound in `control` counts candidates across all workers.
    pub fn run_parallel<S>(
        &mut self,
        jobs: usize,
        base_seed: u64,
        control: &SearchControl,
        sink: &mut S,
    ) -> SearchState
    where
        S: ImprovementSink + Send,
    {
        let jobs = jobs.max(1);
        let start = self.iterations;
        let counter = AtomicU64::new(0);
        let shared = Mutex::new(Shared {
            state: self.state,
            sink,
        });
        let scorer = self.scorer;
        let strategy = self.strategy.as_ref();

        std::thread::scope(|scope| {
            for worker in 0..jobs {
                let counter = &counter;
                let shared = &shared;
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(worker as u64));
                    loop {
                        if control.should_stop() {
                            break;
                        }
                        let taken = counter.fetch_add(1, Ordering::Relaxed);
                        if control.exhausted(taken) {
                            break;
                        }
                        let snapshot = shared.lock().unwrap_or_else(PoisonError::into_inner).state;
                        let candidate = strategy.propose(&snapshot.best, &mut rng);
                        let score = scorer.score_within(&candidate, snapshot.score);
                        if score > snapshot.score {
                            continue;
                        }

                        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                        if score <= guard.state.score {
                            guard.state = SearchState {
                                best: candidate,
                                score,
                            };
                            let improvement = Improvement {
                                iteration: start + taken + 1,
                                score,
                                params: candidate,
                            };
                            tracing::debug!(worker, iteration = improvement.iteration, score, "accepted {candidate}");
                            guard.sink.improved(&improvement);
                        }
                    }
                });
            }
        });

        let ran = counter.into_inner();
        let ran = control.max_iterations.map_or(ran, |max| ran.min(max));
        self.iterations = start + ran;
        self.state = shared.into_inner().unwrap_or_else(PoisonError::into_inner).state;
        self.state
    }
}
