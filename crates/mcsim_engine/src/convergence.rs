//! Stopping rules for Monte Carlo sampling.
//!
//! A [`ConvergenceController`] drives any [`Sampler`] under one of two
//! [`ConvergenceCriterion`]s:
//!
//! - **Fixed samples**: one batch tops the sampler up to the requested
//!   total; the run always ends [`ConvergenceStatus::Converged`].
//! - **Tolerance**: batches grow until the error estimate is at most the
//!   tolerance, or the sample cap is hit.
//!
//! # Batch growth
//!
//! ```text
//! first batch = min_batch - n                    (n < min_batch)
//! next batch  = max(n * (err / tol)^2 * 0.8 - n, min_batch)
//! batch       = min(batch, cap - n)
//! ```
//!
//! The cap defaults to [`MAX_SAMPLES`], so the adaptive loop is always
//! bounded. A [`CancellationToken`] and an optional wall-clock deadline are
//! checked before every batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mcsim_core::SimulationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{ModelState, Sampler};

/// Size of the first adaptive batch.
pub const MIN_BATCH: usize = 1023;

/// Hard ceiling on the number of samples of one calculation.
pub const MAX_SAMPLES: usize = 10_000_000;

/// When to stop sampling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceCriterion {
    /// Sample until the standard error is at most `tolerance`.
    Tolerance {
        /// Target standard error
        tolerance: f64,
        /// Sample cap; [`MAX_SAMPLES`] when absent
        max_samples: Option<usize>,
    },
    /// Sample exactly this many samples.
    FixedSamples(usize),
}

impl ConvergenceCriterion {
    /// Builds a criterion from optional settings.
    ///
    /// # Errors
    ///
    /// `Configuration` if neither or both of `tolerance` and
    /// `required_samples` are given, or the result does not validate.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcsim_engine::convergence::ConvergenceCriterion;
    ///
    /// let c = ConvergenceCriterion::from_options(Some(0.01), None, Some(100_000)).unwrap();
    /// assert!(matches!(c, ConvergenceCriterion::Tolerance { .. }));
    ///
    /// let err = ConvergenceCriterion::from_options(None, None, None).unwrap_err();
    /// assert!(err.to_string().contains("neither tolerance nor number of samples set"));
    /// ```
    pub fn from_options(
        tolerance: Option<f64>,
        required_samples: Option<usize>,
        max_samples: Option<usize>,
    ) -> Result<Self, SimulationError> {
        let criterion = match (tolerance, required_samples) {
            (None, None) => {
                return Err(SimulationError::configuration(
                    "neither tolerance nor number of samples set",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(SimulationError::configuration(
                    "both tolerance and number of samples set",
                ))
            }
            (Some(tolerance), None) => ConvergenceCriterion::Tolerance {
                tolerance,
                max_samples,
            },
            (None, Some(n)) => ConvergenceCriterion::FixedSamples(n),
        };
        criterion.validate()?;
        Ok(criterion)
    }

    /// Checks the criterion's values.
    ///
    /// # Errors
    ///
    /// `Configuration` for a non-positive or non-finite tolerance, or a
    /// sample count (or cap) of zero or above [`MAX_SAMPLES`].
    pub fn validate(&self) -> Result<(), SimulationError> {
        let check_count = |name: &str, n: usize| {
            if n == 0 || n > MAX_SAMPLES {
                Err(SimulationError::configuration(format!(
                    "{} must be in [1, {}], got {}",
                    name, MAX_SAMPLES, n
                )))
            } else {
                Ok(())
            }
        };
        match *self {
            ConvergenceCriterion::Tolerance {
                tolerance,
                max_samples,
            } => {
                if !(tolerance.is_finite() && tolerance > 0.0) {
                    return Err(SimulationError::configuration(format!(
                        "tolerance must be positive and finite, got {}",
                        tolerance
                    )));
                }
                match max_samples {
                    Some(cap) => check_count("max_samples", cap),
                    None => Ok(()),
                }
            }
            ConvergenceCriterion::FixedSamples(n) => check_count("required_samples", n),
        }
    }
}

/// Why a run stopped short of its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// The sample cap was reached.
    SampleCap,
    /// The cancellation token was triggered.
    Cancelled,
    /// The wall-clock deadline passed.
    DeadlineElapsed,
}

/// Outcome of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// Target precision or sample count reached.
    Converged,
    /// Stopped early; the estimate is the best available.
    Exhausted(ExhaustionReason),
}

impl ConvergenceStatus {
    /// Returns `true` for [`ConvergenceStatus::Converged`].
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }
}

/// Result of a pricing calculation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PricingResult {
    /// Estimated present value.
    pub value: f64,
    /// Standard error, when the random stream supports one.
    pub error_estimate: Option<f64>,
    /// Number of samples accumulated.
    pub samples: usize,
    /// Whether the run converged.
    pub status: ConvergenceStatus,
}

impl PricingResult {
    /// Returns the 95% confidence interval half-width.
    #[inline]
    pub fn confidence_95(&self) -> Option<f64> {
        self.error_estimate.map(|e| 1.96 * e)
    }

    /// Returns the 99% confidence interval half-width.
    #[inline]
    pub fn confidence_99(&self) -> Option<f64> {
        self.error_estimate.map(|e| 2.576 * e)
    }
}

/// Shared flag requesting that sampling stop at the next batch boundary.
///
/// # Examples
///
/// ```
/// use mcsim_engine::convergence::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Drives a [`Sampler`] until its criterion is met.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::convergence::{ConvergenceController, ConvergenceCriterion, ConvergenceStatus};
/// use mcsim_engine::model::MonteCarloModel;
/// use mcsim_engine::path::{EulerPathGenerator, Path};
/// use mcsim_engine::process::BlackScholesProcess;
/// use mcsim_engine::rng::PseudoRandom;
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 1).unwrap());
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
/// let generator =
///     EulerPathGenerator::new(process, PseudoRandom::new(grid.intervals(), 1), grid).unwrap();
/// let mut model = MonteCarloModel::builder(generator, |p: &Path| p.back()).build().unwrap();
///
/// let criterion = ConvergenceCriterion::Tolerance { tolerance: 0.5, max_samples: None };
/// let result = ConvergenceController::new().run(&mut model, &criterion).unwrap();
/// assert_eq!(result.status, ConvergenceStatus::Converged);
/// assert!(result.error_estimate.unwrap() <= 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct ConvergenceController {
    min_batch: usize,
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Default for ConvergenceController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvergenceController {
    /// Creates a controller with a first batch of [`MIN_BATCH`] samples.
    pub fn new() -> Self {
        Self {
            min_batch: MIN_BATCH,
            cancellation: None,
            deadline: None,
        }
    }

    /// Overrides the minimum batch size (at least 1).
    pub fn with_min_batch(mut self, min_batch: usize) -> Self {
        self.min_batch = min_batch.max(1);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Stops sampling at the first batch boundary after `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stops sampling at the first batch boundary after `limit` from now.
    pub fn with_time_limit(self, limit: Duration) -> Self {
        self.with_deadline(Instant::now() + limit)
    }

    /// Runs `sampler` under `criterion`.
    ///
    /// # Errors
    ///
    /// `Configuration` if the criterion is invalid, or if it is
    /// tolerance-driven and the sampler has no error estimate.
    pub fn run<S: Sampler + ?Sized>(
        &self,
        sampler: &mut S,
        criterion: &ConvergenceCriterion,
    ) -> Result<PricingResult, SimulationError> {
        criterion.validate()?;
        match *criterion {
            ConvergenceCriterion::FixedSamples(n) => self.run_fixed(sampler, n),
            ConvergenceCriterion::Tolerance {
                tolerance,
                max_samples,
            } => {
                if !sampler.allows_error_estimate() {
                    return Err(SimulationError::configuration(
                        "tolerance given for a random stream without an error estimate",
                    ));
                }
                Ok(self.run_tolerance(sampler, tolerance, max_samples.unwrap_or(MAX_SAMPLES)))
            }
        }
    }

    fn run_fixed<S: Sampler + ?Sized>(
        &self,
        sampler: &mut S,
        required: usize,
    ) -> Result<PricingResult, SimulationError> {
        if let Some(reason) = self.interruption() {
            return Ok(finish(sampler, ConvergenceStatus::Exhausted(reason)));
        }
        let current = sampler.estimate().samples;
        let per_draw = sampler.samples_per_draw().max(1);
        // an odd count with antithetic pairs rounds up to the next pair
        let draws = required.saturating_sub(current).div_ceil(per_draw);
        debug!(draws, per_draw, current, required, "fixed-sample batch");
        sampler.add_samples(draws);
        Ok(finish(sampler, ConvergenceStatus::Converged))
    }

    fn run_tolerance<S: Sampler + ?Sized>(
        &self,
        sampler: &mut S,
        tolerance: f64,
        cap: usize,
    ) -> PricingResult {
        let first_check = self.min_batch.min(cap).max(2);
        let per_draw = sampler.samples_per_draw().max(1);
        loop {
            let estimate = sampler.estimate();
            let n = estimate.samples;

            if n >= first_check {
                if let Some(error) = estimate.error_estimate {
                    if error <= tolerance {
                        return finish(sampler, ConvergenceStatus::Converged);
                    }
                }
            }
            if n >= cap {
                return finish(sampler, ConvergenceStatus::Exhausted(ExhaustionReason::SampleCap));
            }
            if let Some(reason) = self.interruption() {
                return finish(sampler, ConvergenceStatus::Exhausted(reason));
            }

            let batch = if n < self.min_batch {
                self.min_batch - n
            } else {
                match estimate.error_estimate {
                    Some(error) => self.next_batch(n, error, tolerance),
                    None => self.min_batch,
                }
            };
            let draws = batch.div_ceil(per_draw).min((cap - n) / per_draw);
            if draws == 0 {
                return finish(sampler, ConvergenceStatus::Exhausted(ExhaustionReason::SampleCap));
            }
            debug!(
                samples = n,
                draws,
                per_draw,
                error = ?estimate.error_estimate,
                tolerance,
                "adaptive batch"
            );
            sampler.add_samples(draws);
        }
    }

    fn next_batch(&self, n: usize, error: f64, tolerance: f64) -> usize {
        let order = (error / tolerance).powi(2);
        let grown = n as f64 * order * 0.8 - n as f64;
        if grown.is_finite() && grown > self.min_batch as f64 {
            // saturating float-to-int cast
            grown as usize
        } else {
            self.min_batch
        }
    }

    fn interruption(&self) -> Option<ExhaustionReason> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Some(ExhaustionReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(ExhaustionReason::DeadlineElapsed);
        }
        None
    }
}

fn finish<S: Sampler + ?Sized>(sampler: &mut S, status: ConvergenceStatus) -> PricingResult {
    let estimate = sampler.estimate();
    match status {
        ConvergenceStatus::Converged => {
            sampler.set_state(ModelState::Converged);
            info!(
                value = estimate.mean,
                error = ?estimate.error_estimate,
                samples = estimate.samples,
                "sampling converged"
            );
        }
        ConvergenceStatus::Exhausted(reason) => {
            sampler.set_state(ModelState::Exhausted);
            warn!(
                value = estimate.mean,
                error = ?estimate.error_estimate,
                samples = estimate.samples,
                ?reason,
                "sampling exhausted before reaching tolerance"
            );
        }
    }
    PricingResult {
        value: estimate.mean,
        error_estimate: estimate.error_estimate,
        samples: estimate.samples,
        status,
    }
}
