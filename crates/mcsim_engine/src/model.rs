//! Monte Carlo model: the path-sampling loop with variance reduction.
//!
//! [`MonteCarloModel`] owns a [`PathGenerator`], a target [`PathPricer`] and
//! the running accumulators. Each draw generates one path, prices it, and
//! optionally
//!
//! - prices the antithetic path as well, recording it as a second sample, and
//! - prices a control on the same path(s), recording `(target, control)`
//!   pairs so that the estimate can be corrected by the control's known
//!   reference value.
//!
//! Stopping is not decided here: [`Sampler::value`] and
//! [`Sampler::value_with_samples`] hand the model to a
//! [`ConvergenceController`].

use mcsim_core::statistics::{PairedStatistics, SampleStatistics};
use mcsim_core::SimulationError;
use serde::Serialize;

use crate::convergence::{ConvergenceController, ConvergenceCriterion, PricingResult};
use crate::path::PathGenerator;
use crate::pricer::{NoControl, PathPricer};

/// Lifecycle of a sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ModelState {
    /// Built but no samples drawn yet.
    #[default]
    Unconfigured,
    /// Samples are being accumulated.
    Sampling,
    /// The requested precision or sample count was reached.
    Converged,
    /// Sampling stopped before the requested precision was reached.
    Exhausted,
}

/// Point estimate read from a sampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Estimate {
    /// Estimated value (control-corrected when a control is configured).
    pub mean: f64,
    /// Standard error, when the random stream supports one.
    pub error_estimate: Option<f64>,
    /// Number of accumulated samples.
    pub samples: usize,
}

/// Anything the convergence controller can drive.
pub trait Sampler {
    /// Performs `n` further draws, accumulating
    /// `n * samples_per_draw()` samples.
    fn add_samples(&mut self, n: usize);

    /// Number of samples one draw contributes: 2 with antithetic sampling.
    fn samples_per_draw(&self) -> usize {
        1
    }

    /// Returns the current estimate.
    fn estimate(&self) -> Estimate;

    /// Returns whether [`Estimate::error_estimate`] is ever available.
    fn allows_error_estimate(&self) -> bool;

    /// Returns the lifecycle state.
    fn state(&self) -> ModelState;

    /// Records a state transition. Called by the convergence controller.
    fn set_state(&mut self, state: ModelState);

    /// Samples until the error estimate is at most `tolerance` or
    /// `max_samples` is reached.
    ///
    /// # Errors
    ///
    /// `Configuration` for an invalid tolerance or cap, or if the sampler
    /// has no error estimate.
    fn value(
        &mut self,
        tolerance: f64,
        max_samples: Option<usize>,
    ) -> Result<PricingResult, SimulationError>
    where
        Self: Sized,
    {
        ConvergenceController::new().run(
            self,
            &ConvergenceCriterion::Tolerance {
                tolerance,
                max_samples,
            },
        )
    }

    /// Samples until exactly `samples` samples have been accumulated.
    ///
    /// # Errors
    ///
    /// `Configuration` if `samples` is zero or above the global ceiling.
    fn value_with_samples(&mut self, samples: usize) -> Result<PricingResult, SimulationError>
    where
        Self: Sized,
    {
        ConvergenceController::new().run(self, &ConvergenceCriterion::FixedSamples(samples))
    }
}

/// Control pricer paired with the known value of its expectation.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlVariate<C> {
    /// Pricer evaluated on the same paths as the target.
    pub pricer: C,
    /// Exact (or independently computed) value of the control.
    pub reference: f64,
}

/// Sequential Monte Carlo model.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::model::{ModelState, MonteCarloModel, Sampler};
/// use mcsim_engine::path::{EulerPathGenerator, Path};
/// use mcsim_engine::process::BlackScholesProcess;
/// use mcsim_engine::rng::PseudoRandom;
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 4).unwrap());
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
/// let generator =
///     EulerPathGenerator::new(process, PseudoRandom::new(grid.intervals(), 7), grid).unwrap();
///
/// let mut model = MonteCarloModel::builder(generator, |p: &Path| p.back())
///     .antithetic(true)
///     .build()
///     .unwrap();
///
/// let result = model.value_with_samples(2_000).unwrap();
/// assert_eq!(result.samples, 2_000);
/// assert_eq!(model.paths_evaluated(), 2_000);
/// assert_eq!(model.state(), ModelState::Converged);
/// assert!((result.value - 100.0).abs() < 1.0);
/// ```
pub struct MonteCarloModel<G, P, C = NoControl> {
    generator: G,
    pricer: P,
    control: Option<ControlVariate<C>>,
    antithetic: bool,
    stats: SampleStatistics,
    paired: PairedStatistics,
    paths_evaluated: usize,
    state: ModelState,
}

impl<G: PathGenerator, P: PathPricer> MonteCarloModel<G, P, NoControl> {
    /// Starts building a model from a generator and a target pricer.
    pub fn builder(generator: G, pricer: P) -> MonteCarloModelBuilder<G, P, NoControl> {
        MonteCarloModelBuilder {
            generator,
            pricer,
            control_pricer: None,
            control_reference: None,
            control_variate: false,
            antithetic: false,
            accumulator: None,
        }
    }
}

impl<G: PathGenerator, P: PathPricer, C: PathPricer> MonteCarloModel<G, P, C> {
    /// Returns the raw accumulator of target values.
    ///
    /// With antithetic sampling both paths of a pair are entries.
    pub fn sample_accumulator(&self) -> &SampleStatistics {
        &self.stats
    }

    /// Returns the `(target, control)` accumulator when a control is used.
    pub fn paired_accumulator(&self) -> Option<&PairedStatistics> {
        self.control.as_ref().map(|_| &self.paired)
    }

    /// Returns the control reference value when a control is used.
    pub fn control_reference(&self) -> Option<f64> {
        self.control.as_ref().map(|c| c.reference)
    }

    /// Returns whether antithetic paths are evaluated.
    pub fn is_antithetic(&self) -> bool {
        self.antithetic
    }

    /// Returns the number of paths priced so far.
    pub fn paths_evaluated(&self) -> usize {
        self.paths_evaluated
    }

    /// Returns the path generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G, P, C> MonteCarloModel<G, P, C> {
    fn record(&mut self, target: f64, control: Option<f64>) {
        self.stats.add(target);
        if let Some(value) = control {
            self.paired.add(target, value);
        }
        self.paths_evaluated += 1;
    }
}

impl<G: PathGenerator, P: PathPricer, C: PathPricer> Sampler for MonteCarloModel<G, P, C> {
    fn add_samples(&mut self, n: usize) {
        if n > 0 && self.state == ModelState::Unconfigured {
            self.state = ModelState::Sampling;
        }
        for _ in 0..n {
            let path = self.generator.next();
            let target = self.pricer.evaluate(path);
            let control = self.control.as_mut().map(|c| c.pricer.evaluate(path));
            self.record(target, control);

            if self.antithetic {
                let path = self.generator.antithetic();
                let target = self.pricer.evaluate(path);
                let control = self.control.as_mut().map(|c| c.pricer.evaluate(path));
                self.record(target, control);
            }
        }
    }

    fn samples_per_draw(&self) -> usize {
        if self.antithetic {
            2
        } else {
            1
        }
    }

    fn estimate(&self) -> Estimate {
        let control = self.control.as_ref().map(|c| (&self.paired, c.reference));
        estimate_of(&self.stats, control)
    }

    fn allows_error_estimate(&self) -> bool {
        self.stats.allows_error_estimate()
    }

    fn state(&self) -> ModelState {
        self.state
    }

    fn set_state(&mut self, state: ModelState) {
        self.state = state;
    }
}

/// Reads an estimate from raw and (optionally) paired accumulators.
pub(crate) fn estimate_of(
    stats: &SampleStatistics,
    control: Option<(&PairedStatistics, f64)>,
) -> Estimate {
    match control {
        Some((paired, reference)) => Estimate {
            mean: paired.corrected_mean(reference),
            error_estimate: paired.corrected_error_estimate(),
            samples: paired.samples(),
        },
        None => Estimate {
            mean: stats.mean(),
            error_estimate: stats.error_estimate(),
            samples: stats.samples(),
        },
    }
}

/// Builder for [`MonteCarloModel`].
///
/// Validation happens in [`MonteCarloModelBuilder::build`].
pub struct MonteCarloModelBuilder<G, P, C = NoControl> {
    generator: G,
    pricer: P,
    control_pricer: Option<C>,
    control_reference: Option<f64>,
    control_variate: bool,
    antithetic: bool,
    accumulator: Option<SampleStatistics>,
}

impl<G: PathGenerator, P: PathPricer, C: PathPricer> MonteCarloModelBuilder<G, P, C> {
    /// Enables or disables antithetic sampling.
    #[inline]
    pub fn antithetic(mut self, enabled: bool) -> Self {
        self.antithetic = enabled;
        self
    }

    /// Enables or disables the control variate.
    ///
    /// Enabling requires [`control_pricer`](Self::control_pricer) and
    /// [`control_reference`](Self::control_reference) as well.
    #[inline]
    pub fn control_variate(mut self, enabled: bool) -> Self {
        self.control_variate = enabled;
        self
    }

    /// Sets the control pricer.
    pub fn control_pricer<C2: PathPricer>(self, pricer: C2) -> MonteCarloModelBuilder<G, P, C2> {
        MonteCarloModelBuilder {
            generator: self.generator,
            pricer: self.pricer,
            control_pricer: Some(pricer),
            control_reference: self.control_reference,
            control_variate: self.control_variate,
            antithetic: self.antithetic,
            accumulator: self.accumulator,
        }
    }

    /// Sets the known value of the control.
    #[inline]
    pub fn control_reference(mut self, reference: f64) -> Self {
        self.control_reference = Some(reference);
        self
    }

    /// Seeds the raw accumulator.
    ///
    /// Its error-estimate flag is combined with the generator's.
    #[inline]
    pub fn accumulator(mut self, accumulator: SampleStatistics) -> Self {
        self.accumulator = Some(accumulator);
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    ///
    /// `Configuration` if the control variate is enabled without a control
    /// pricer or a finite reference value, or together with a non-empty
    /// initial accumulator.
    pub fn build(self) -> Result<MonteCarloModel<G, P, C>, SimulationError> {
        let allows_error = self.generator.allows_error_estimate();
        let stats = self.accumulator.unwrap_or_default();
        let stats_allowed = stats.allows_error_estimate() && allows_error;
        let stats = stats.with_error_estimate(stats_allowed);

        let control = if self.control_variate {
            let pricer = self.control_pricer.ok_or_else(|| {
                SimulationError::configuration(
                    "control variate requested without a control path pricer",
                )
            })?;
            let reference = match self.control_reference {
                Some(r) if r.is_finite() => r,
                _ => {
                    return Err(SimulationError::configuration(
                        "control variate requested without a finite control reference value",
                    ))
                }
            };
            if stats.samples() > 0 {
                return Err(SimulationError::configuration(
                    "control variate cannot resume from a non-empty accumulator",
                ));
            }
            Some(ControlVariate { pricer, reference })
        } else {
            None
        };

        Ok(MonteCarloModel {
            generator: self.generator,
            pricer: self.pricer,
            control,
            antithetic: self.antithetic,
            paired: PairedStatistics::new().with_error_estimate(stats_allowed),
            stats,
            paths_evaluated: 0,
            state: ModelState::Unconfigured,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{EulerPathGenerator, Path};
    use crate::process::BlackScholesProcess;
    use crate::rng::{HaltonSequence, PseudoRandom};
    use approx::assert_relative_eq;
    use mcsim_core::TimeGrid;
    use std::sync::Arc;

    /// Generator returning two fixed paths: [1, 3] and antithetic [1, -1].
    struct FixedGenerator {
        grid: Arc<TimeGrid>,
        up: Path,
        down: Path,
    }

    impl FixedGenerator {
        fn new() -> Self {
            let grid = Arc::new(TimeGrid::from_horizon(1.0, 1).unwrap());
            let up = Path::from_values(Arc::clone(&grid), vec![1.0, 2.0, 3.0]).unwrap();
            let down = Path::from_values(Arc::clone(&grid), vec![1.0, 0.0, -1.0]).unwrap();
            Self { grid, up, down }
        }
    }

    impl PathGenerator for FixedGenerator {
        fn next(&mut self) -> &Path {
            &self.up
        }
        fn antithetic(&mut self) -> &Path {
            &self.down
        }
        fn grid(&self) -> &Arc<TimeGrid> {
            &self.grid
        }
        fn allows_error_estimate(&self) -> bool {
            true
        }
    }

    fn gbm_generator(seed: u64) -> EulerPathGenerator<BlackScholesProcess, PseudoRandom> {
        let grid = Arc::new(TimeGrid::from_horizon(1.0, 4).unwrap());
        let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.25).unwrap();
        EulerPathGenerator::new(process, PseudoRandom::new(grid.intervals(), seed), grid).unwrap()
    }

    #[test]
    fn test_antithetic_pair_adds_two_samples() {
        let mut model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .antithetic(true)
            .build()
            .unwrap();
        assert_eq!(model.samples_per_draw(), 2);
        model.add_samples(1);

        assert_eq!(model.sample_accumulator().samples(), 2);
        assert_eq!(model.estimate().samples, 2);
        assert_eq!(model.estimate().mean, 1.0);
        assert_eq!(model.paths_evaluated(), 2);

        model.add_samples(9);
        assert_eq!(model.sample_accumulator().samples(), 20);
        assert_eq!(model.paths_evaluated(), 20);
    }

    #[test]
    fn test_antithetic_feeds_both_pairs_to_control() {
        let mut model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .antithetic(true)
            .control_variate(true)
            .control_pricer(|p: &Path| 2.0 * p.back())
            .control_reference(2.0)
            .build()
            .unwrap();
        model.add_samples(10);

        let paired = model.paired_accumulator().unwrap();
        assert_eq!(paired.samples(), 20);
        let estimate = model.estimate();
        assert_eq!(estimate.samples, 20);
        assert_relative_eq!(estimate.mean, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_count_with_antithetic_is_exact() {
        let mut model = MonteCarloModel::builder(gbm_generator(3), |p: &Path| p.back())
            .antithetic(true)
            .build()
            .unwrap();
        let result = model.value_with_samples(1_001).unwrap();
        assert_eq!(result.samples, 1_002);
        assert_eq!(model.paths_evaluated(), 1_002);
    }

    #[test]
    fn test_without_antithetic() {
        let mut model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .build()
            .unwrap();
        model.add_samples(3);
        assert_eq!(model.estimate().mean, 3.0);
        assert_eq!(model.paths_evaluated(), 3);
    }

    #[test]
    fn test_state_transitions_on_first_sample() {
        let mut model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .build()
            .unwrap();
        assert_eq!(model.state(), ModelState::Unconfigured);
        model.add_samples(0);
        assert_eq!(model.state(), ModelState::Unconfigured);
        model.add_samples(1);
        assert_eq!(model.state(), ModelState::Sampling);
    }

    #[test]
    fn test_control_variate_without_pricer_rejected() {
        let result = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .control_variate(true)
            .control_reference(1.0)
            .build();
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_control_variate_without_reference_rejected() {
        let result = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .control_variate(true)
            .control_pricer(|p: &Path| p.back())
            .build();
        assert!(matches!(result, Err(SimulationError::Configuration(_))));

        let nan = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .control_variate(true)
            .control_pricer(|p: &Path| p.back())
            .control_reference(f64::NAN)
            .build();
        assert!(matches!(nan, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_control_pricer_ignored_when_disabled() {
        let model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .control_pricer(|p: &Path| p.back())
            .control_reference(0.0)
            .build()
            .unwrap();
        assert!(model.paired_accumulator().is_none());
        assert_eq!(model.control_reference(), None);
    }

    #[test]
    fn test_identical_control_gives_zero_error() {
        let mut model = MonteCarloModel::builder(gbm_generator(3), |p: &Path| p.back())
            .control_variate(true)
            .control_pricer(|p: &Path| p.back())
            .control_reference(100.0)
            .build()
            .unwrap();

        for n in [10, 100, 1000] {
            model.add_samples(n);
            let estimate = model.estimate();
            assert_relative_eq!(estimate.mean, 100.0, epsilon = 1e-9);
            assert_relative_eq!(estimate.error_estimate.unwrap(), 0.0, epsilon = 1e-9);
        }
        assert!(model.sample_accumulator().error_estimate().unwrap() > 0.0);
    }

    #[test]
    fn test_correlated_control_reduces_error() {
        let call = |p: &Path| (p.back() - 100.0).max(0.0);
        let mut model = MonteCarloModel::builder(gbm_generator(11), call)
            .control_variate(true)
            .control_pricer(|p: &Path| p.back())
            .control_reference(100.0)
            .build()
            .unwrap();
        model.add_samples(5_000);

        let raw = model.sample_accumulator().error_estimate().unwrap();
        let corrected = model.estimate().error_estimate.unwrap();
        assert!(corrected < raw);
    }

    #[test]
    fn test_antithetic_cancels_noise_in_log_terminal() {
        // ln S_T is linear in the driving normals, so each pair averages
        // to the drift exactly.
        let mut plain = MonteCarloModel::builder(gbm_generator(5), |p: &Path| p.back().ln())
            .build()
            .unwrap();
        let mut anti = MonteCarloModel::builder(gbm_generator(5), |p: &Path| p.back().ln())
            .antithetic(true)
            .build()
            .unwrap();
        plain.add_samples(2_000);
        anti.add_samples(1_000);
        assert_eq!(plain.paths_evaluated(), anti.paths_evaluated());

        let drift = 100.0_f64.ln() - 0.5 * 0.25 * 0.25;
        assert_relative_eq!(anti.estimate().mean, drift, epsilon = 1e-10);
        assert!((plain.estimate().mean - drift).abs() > 1e-10);
    }

    #[test]
    fn test_low_discrepancy_disables_error_estimate() {
        let grid = Arc::new(TimeGrid::from_horizon(1.0, 4).unwrap());
        let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.25).unwrap();
        let generator =
            EulerPathGenerator::new(process, HaltonSequence::new(grid.intervals()), grid).unwrap();
        let mut model = MonteCarloModel::builder(generator, |p: &Path| p.back())
            .build()
            .unwrap();
        model.add_samples(100);
        assert!(!model.allows_error_estimate());
        assert_eq!(model.estimate().error_estimate, None);
    }

    #[test]
    fn test_control_rejects_non_empty_accumulator() {
        let mut seeded = SampleStatistics::new();
        seeded.add(1.0);
        let result = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .accumulator(seeded)
            .control_variate(true)
            .control_pricer(|p: &Path| p.back())
            .control_reference(0.0)
            .build();
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_resume_from_initial_accumulator() {
        let mut seeded = SampleStatistics::new();
        seeded.extend([3.0, 3.0]);
        let mut model = MonteCarloModel::builder(FixedGenerator::new(), |p: &Path| p.back())
            .accumulator(seeded)
            .build()
            .unwrap();
        let result = model.value_with_samples(5).unwrap();
        assert_eq!(result.samples, 5);
        assert_eq!(model.paths_evaluated(), 3);
    }
}
