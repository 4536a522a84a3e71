//! Engine configuration.
//!
//! [`EngineConfig`] gathers every setting of a Monte Carlo calculation and is
//! validated once, when [`EngineConfigBuilder::build`] runs, so that a
//! configured engine never fails for configuration reasons mid-calculation.

use mcsim_core::SimulationError;
use serde::Serialize;

use crate::convergence::ConvergenceCriterion;
use crate::pricer::CorrectionKind;
use crate::rng::{RandomStreamKind, DEFAULT_AUXILIARY_SEED};

/// Maximum number of time steps per year.
pub const MAX_STEPS_PER_YEAR: usize = 10_000;

/// Maximum number of parallel shards.
pub const MAX_SHARDS: usize = 1_024;

/// Validated engine configuration.
///
/// Use [`EngineConfig::builder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use mcsim_engine::config::EngineConfig;
/// use mcsim_engine::convergence::ConvergenceCriterion;
///
/// let config = EngineConfig::builder()
///     .max_steps_per_year(52)
///     .antithetic(true)
///     .tolerance(1e-3)
///     .max_samples(500_000)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.max_steps_per_year(), 52);
/// assert!(matches!(config.criterion(), ConvergenceCriterion::Tolerance { .. }));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineConfig {
    max_steps_per_year: usize,
    antithetic: bool,
    control_variate: bool,
    control_reference: Option<f64>,
    criterion: ConvergenceCriterion,
    seed: u64,
    shards: usize,
    random_stream: RandomStreamKind,
    correction: CorrectionKind,
    auxiliary_seed: u64,
}

impl EngineConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Returns the maximum number of time steps per year.
    #[inline]
    pub fn max_steps_per_year(&self) -> usize {
        self.max_steps_per_year
    }

    /// Returns whether antithetic sampling is enabled.
    #[inline]
    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Returns whether the control variate is enabled.
    #[inline]
    pub fn control_variate(&self) -> bool {
        self.control_variate
    }

    /// Returns the control reference value.
    #[inline]
    pub fn control_reference(&self) -> Option<f64> {
        self.control_reference
    }

    /// Returns the convergence criterion.
    #[inline]
    pub fn criterion(&self) -> ConvergenceCriterion {
        self.criterion
    }

    /// Returns the base seed of the path-generation stream.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of parallel shards.
    #[inline]
    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Returns the random stream family.
    #[inline]
    pub fn random_stream(&self) -> RandomStreamKind {
        self.random_stream
    }

    /// Returns the discreteness correction.
    #[inline]
    pub fn correction(&self) -> CorrectionKind {
        self.correction
    }

    /// Returns the seed of the auxiliary uniform sequence.
    #[inline]
    pub fn auxiliary_seed(&self) -> u64 {
        self.auxiliary_seed
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// `Configuration` if:
    /// - `max_steps_per_year` is 0 or greater than 10,000
    /// - `shards` is 0 or greater than 1,024
    /// - the criterion is invalid
    /// - a tolerance is combined with a low-discrepancy stream
    /// - the control variate lacks a finite reference value
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.max_steps_per_year == 0 || self.max_steps_per_year > MAX_STEPS_PER_YEAR {
            return Err(SimulationError::configuration(format!(
                "max_steps_per_year must be in [1, {}], got {}",
                MAX_STEPS_PER_YEAR, self.max_steps_per_year
            )));
        }
        if self.shards == 0 || self.shards > MAX_SHARDS {
            return Err(SimulationError::configuration(format!(
                "shards must be in [1, {}], got {}",
                MAX_SHARDS, self.shards
            )));
        }
        self.criterion.validate()?;
        if matches!(self.criterion, ConvergenceCriterion::Tolerance { .. })
            && !self.random_stream.allows_error_estimate()
        {
            return Err(SimulationError::configuration(format!(
                "tolerance given for {} stream without an error estimate",
                self.random_stream
            )));
        }
        if self.control_variate && !self.control_reference.is_some_and(f64::is_finite) {
            return Err(SimulationError::configuration(
                "control variate requested without a finite control reference value",
            ));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
///
/// Provides a fluent API with validation at build time.
#[derive(Clone, Debug)]
pub struct EngineConfigBuilder {
    max_steps_per_year: Option<usize>,
    antithetic: bool,
    control_variate: bool,
    control_reference: Option<f64>,
    tolerance: Option<f64>,
    required_samples: Option<usize>,
    max_samples: Option<usize>,
    seed: u64,
    shards: usize,
    random_stream: RandomStreamKind,
    correction: CorrectionKind,
    auxiliary_seed: u64,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            max_steps_per_year: None,
            antithetic: false,
            control_variate: false,
            control_reference: None,
            tolerance: None,
            required_samples: None,
            max_samples: None,
            seed: 0,
            shards: 1,
            random_stream: RandomStreamKind::default(),
            correction: CorrectionKind::default(),
            auxiliary_seed: DEFAULT_AUXILIARY_SEED,
        }
    }
}

impl EngineConfigBuilder {
    /// Sets the maximum number of time steps per year.
    ///
    /// # Arguments
    ///
    /// * `steps` - Steps per year in [1, 10_000]
    #[inline]
    pub fn max_steps_per_year(mut self, steps: usize) -> Self {
        self.max_steps_per_year = Some(steps);
        self
    }

    /// Enables or disables antithetic sampling.
    #[inline]
    pub fn antithetic(mut self, enabled: bool) -> Self {
        self.antithetic = enabled;
        self
    }

    /// Enables or disables the control variate.
    #[inline]
    pub fn control_variate(mut self, enabled: bool) -> Self {
        self.control_variate = enabled;
        self
    }

    /// Sets the known value of the control.
    #[inline]
    pub fn control_reference(mut self, reference: f64) -> Self {
        self.control_reference = Some(reference);
        self
    }

    /// Sets the target standard error.
    #[inline]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Sets a fixed total number of samples.
    #[inline]
    pub fn required_samples(mut self, samples: usize) -> Self {
        self.required_samples = Some(samples);
        self
    }

    /// Sets the sample cap of tolerance-driven sampling.
    ///
    /// # Arguments
    ///
    /// * `samples` - Cap in [1, 10_000_000]
    #[inline]
    pub fn max_samples(mut self, samples: usize) -> Self {
        self.max_samples = Some(samples);
        self
    }

    /// Sets the base seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of parallel shards.
    #[inline]
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sets the random stream family.
    #[inline]
    pub fn random_stream(mut self, kind: RandomStreamKind) -> Self {
        self.random_stream = kind;
        self
    }

    /// Sets the discreteness correction.
    #[inline]
    pub fn correction(mut self, correction: CorrectionKind) -> Self {
        self.correction = correction;
        self
    }

    /// Sets the seed of the auxiliary uniform sequence.
    #[inline]
    pub fn auxiliary_seed(mut self, seed: u64) -> Self {
        self.auxiliary_seed = seed;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// `Configuration` if `max_steps_per_year` is not set, if neither or
    /// both of tolerance and required samples are set, or if
    /// [`EngineConfig::validate`] fails.
    pub fn build(self) -> Result<EngineConfig, SimulationError> {
        let max_steps_per_year = self
            .max_steps_per_year
            .ok_or_else(|| SimulationError::configuration("max_steps_per_year must be specified"))?;
        let criterion = ConvergenceCriterion::from_options(
            self.tolerance,
            self.required_samples,
            self.max_samples,
        )?;

        let config = EngineConfig {
            max_steps_per_year,
            antithetic: self.antithetic,
            control_variate: self.control_variate,
            control_reference: self.control_reference,
            criterion,
            seed: self.seed,
            shards: self.shards,
            random_stream: self.random_stream,
            correction: self.correction,
            auxiliary_seed: self.auxiliary_seed,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::MAX_SAMPLES;

    fn base() -> EngineConfigBuilder {
        EngineConfig::builder().max_steps_per_year(12)
    }

    #[test]
    fn test_defaults() {
        let config = base().required_samples(1000).build().unwrap();
        assert!(!config.antithetic());
        assert!(!config.control_variate());
        assert_eq!(config.seed(), 0);
        assert_eq!(config.shards(), 1);
        assert_eq!(config.random_stream(), RandomStreamKind::PseudoRandom);
        assert_eq!(config.correction(), CorrectionKind::BrownianBridge);
        assert_eq!(config.auxiliary_seed(), 76);
        assert_eq!(config.criterion(), ConvergenceCriterion::FixedSamples(1000));
    }

    #[test]
    fn test_missing_steps() {
        let result = EngineConfig::builder().required_samples(10).build();
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_zero_and_excess_steps() {
        assert!(EngineConfig::builder()
            .max_steps_per_year(0)
            .required_samples(10)
            .build()
            .is_err());
        assert!(EngineConfig::builder()
            .max_steps_per_year(MAX_STEPS_PER_YEAR + 1)
            .required_samples(10)
            .build()
            .is_err());
    }

    #[test]
    fn test_neither_criterion() {
        let err = base().build().unwrap_err();
        assert_eq!(
            err,
            SimulationError::Configuration("neither tolerance nor number of samples set".into())
        );
    }

    #[test]
    fn test_both_criteria() {
        assert!(base().tolerance(0.01).required_samples(10).build().is_err());
    }

    #[test]
    fn test_sample_ceiling() {
        assert!(base().required_samples(MAX_SAMPLES + 1).build().is_err());
        assert!(base().tolerance(0.01).max_samples(MAX_SAMPLES + 1).build().is_err());
    }

    #[test]
    fn test_zero_shards() {
        assert!(base().required_samples(10).shards(0).build().is_err());
    }

    #[test]
    fn test_tolerance_with_low_discrepancy() {
        let result = base()
            .tolerance(0.01)
            .random_stream(RandomStreamKind::LowDiscrepancy)
            .build();
        assert!(matches!(result, Err(SimulationError::Configuration(_))));

        // a fixed count is fine
        assert!(base()
            .required_samples(4096)
            .random_stream(RandomStreamKind::LowDiscrepancy)
            .build()
            .is_ok());
    }

    #[test]
    fn test_control_variate_requires_reference() {
        assert!(base().required_samples(10).control_variate(true).build().is_err());
        assert!(base()
            .required_samples(10)
            .control_variate(true)
            .control_reference(f64::INFINITY)
            .build()
            .is_err());
        assert!(base()
            .required_samples(10)
            .control_variate(true)
            .control_reference(0.4)
            .build()
            .is_ok());
    }
}
