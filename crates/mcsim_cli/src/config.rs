//! Pricing configuration management
//!
//! Loads a [`PricingConfig`] from a TOML file, `MCSIM_*` environment
//! variables and command-line flags.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Config file
//! 4. Default values

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use mcsim_core::types::DayCountConvention;
use mcsim_engine::config::EngineConfig;
use mcsim_engine::pricer::{CorrectionKind, Exercise, FlatForward, OptionType, Payoff};
use mcsim_engine::process::BlackScholesProcess;
use mcsim_engine::rng::RandomStreamKind;
use serde::Deserialize;

use crate::{CliError, Result};

/// Last exercise time used when the configuration names neither a time nor
/// an expiry date.
pub const DEFAULT_LATEST: f64 = 1.0;

/// Log levels accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Market inputs of the Black-Scholes process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Spot price
    pub spot: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Continuous dividend yield
    pub dividend: f64,
    /// Black volatility
    pub volatility: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            spot: 100.0,
            rate: 0.0,
            dividend: 0.0,
            volatility: 0.2,
        }
    }
}

impl MarketConfig {
    /// Builds the process.
    pub fn process(&self) -> Result<BlackScholesProcess> {
        Ok(BlackScholesProcess::new(
            self.spot,
            self.rate,
            self.dividend,
            self.volatility,
        )?)
    }

    /// Builds the flat discount curve at the risk-free rate.
    pub fn discount_curve(&self) -> FlatForward {
        FlatForward::new(self.rate)
    }
}

/// The American cash-or-nothing option.
///
/// The exercise window ends either at `latest` (in years) or at `expiry`,
/// measured from `valuation_date` with `day_count`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionConfig {
    /// Call pays at or above the strike, put at or below.
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    pub cash: f64,
    /// Start of the exercise window in years
    pub earliest: f64,
    /// End of the exercise window in years
    pub latest: Option<f64>,
    pub valuation_date: Option<NaiveDate>,
    pub expiry: Option<NaiveDate>,
    pub day_count: DayCountConvention,
}

impl Default for OptionConfig {
    fn default() -> Self {
        Self {
            option_type: OptionType::Call,
            strike: 110.0,
            cash: 1.0,
            earliest: 0.0,
            latest: None,
            valuation_date: None,
            expiry: None,
            day_count: DayCountConvention::default(),
        }
    }
}

impl OptionConfig {
    /// Returns the cash-or-nothing payoff.
    pub fn payoff(&self) -> Payoff {
        Payoff::CashOrNothing {
            option_type: self.option_type,
            strike: self.strike,
            cash: self.cash,
        }
    }

    /// Resolves the American exercise window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if both `latest` and `expiry` are set or `expiry`
    /// lacks a valuation date; `Simulation` for an invalid window.
    pub fn exercise(&self) -> Result<Exercise> {
        let latest = match (self.latest, self.expiry) {
            (Some(_), Some(_)) => {
                return Err(CliError::InvalidArgument(
                    "option.latest and option.expiry are mutually exclusive".into(),
                ))
            }
            (Some(latest), None) => latest,
            (None, Some(expiry)) => {
                let valuation = self.valuation_date.ok_or_else(|| {
                    CliError::InvalidArgument("option.expiry requires option.valuation_date".into())
                })?;
                self.day_count.year_fraction(valuation, expiry)
            }
            (None, None) => DEFAULT_LATEST,
        };
        let exercise = Exercise::American {
            earliest: self.earliest,
            latest,
        };
        exercise.validate()?;
        Ok(exercise)
    }
}

/// Monte Carlo settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub steps_per_year: usize,
    pub antithetic: bool,
    pub control_variate: bool,
    /// Known value of the European control
    pub control_reference: Option<f64>,
    pub tolerance: Option<f64>,
    pub samples: Option<usize>,
    pub max_samples: Option<usize>,
    pub seed: u64,
    pub shards: usize,
    pub random_stream: RandomStreamKind,
    pub correction: CorrectionKind,
    pub auxiliary_seed: Option<u64>,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            steps_per_year: 52,
            antithetic: false,
            control_variate: false,
            control_reference: None,
            tolerance: None,
            samples: None,
            max_samples: None,
            seed: 42,
            shards: 1,
            random_stream: RandomStreamKind::default(),
            correction: CorrectionKind::default(),
            auxiliary_seed: None,
            time_limit: None,
        }
    }
}

impl EngineSettings {
    /// Switches to a fixed sample count.
    pub fn set_samples(&mut self, samples: usize) {
        self.samples = Some(samples);
        self.tolerance = None;
    }

    /// Switches to tolerance-driven sampling.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = Some(tolerance);
        self.samples = None;
    }

    /// Builds the validated engine configuration.
    ///
    /// Exactly one of `tolerance` and `samples` must be set.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut builder = EngineConfig::builder()
            .max_steps_per_year(self.steps_per_year)
            .antithetic(self.antithetic)
            .control_variate(self.control_variate)
            .seed(self.seed)
            .shards(self.shards)
            .random_stream(self.random_stream)
            .correction(self.correction);

        if let Some(reference) = self.control_reference {
            builder = builder.control_reference(reference);
        }
        if let Some(seed) = self.auxiliary_seed {
            builder = builder.auxiliary_seed(seed);
        }
        if let Some(cap) = self.max_samples {
            builder = builder.max_samples(cap);
        }
        if let Some(tolerance) = self.tolerance {
            builder = builder.tolerance(tolerance);
        }
        if let Some(samples) = self.samples {
            builder = builder.required_samples(samples);
        }

        Ok(builder.build()?)
    }

    /// Returns the wall-clock limit.
    pub fn time_limit(&self) -> Result<Option<Duration>> {
        self.time_limit
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    CliError::InvalidArgument(format!(
                        "time_limit must be a non-negative number of seconds, got {}",
                        secs
                    ))
                })
            })
            .transpose()
    }
}

/// Complete configuration of `mcsim price`.
///
/// # Example file
///
/// ```toml
/// [market]
/// spot = 100.0
/// volatility = 0.2
///
/// [option]
/// type = "call"
/// strike = 110.0
/// latest = 1.0
///
/// [engine]
/// steps_per_year = 52
/// tolerance = 0.001
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    pub market: MarketConfig,
    pub option: OptionConfig,
    pub engine: EngineSettings,
}

/// Command-line overrides of `mcsim price`.
#[derive(Debug, Clone, Default, Args)]
pub struct PriceOverrides {
    /// Spot price
    #[arg(long)]
    pub spot: Option<f64>,

    /// Black volatility
    #[arg(long)]
    pub volatility: Option<f64>,

    /// Risk-free rate
    #[arg(long)]
    pub rate: Option<f64>,

    /// Option type (call, put)
    #[arg(long = "type")]
    pub option_type: Option<OptionType>,

    /// Strike
    #[arg(long)]
    pub strike: Option<f64>,

    /// End of the exercise window in years
    #[arg(long)]
    pub latest: Option<f64>,

    /// Fixed number of samples
    #[arg(long, conflicts_with = "tolerance")]
    pub samples: Option<usize>,

    /// Target standard error
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Sample cap of tolerance-driven runs
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Base seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of parallel shards
    #[arg(long)]
    pub shards: Option<usize>,

    /// Maximum time steps per year
    #[arg(long)]
    pub steps_per_year: Option<usize>,

    /// Enable antithetic sampling
    #[arg(long)]
    pub antithetic: bool,

    /// Enable the European control variate with this known value
    #[arg(long)]
    pub control_reference: Option<f64>,

    /// Random stream (pseudo_random, low_discrepancy)
    #[arg(long)]
    pub stream: Option<RandomStreamKind>,

    /// Discreteness correction (brownian_bridge, none)
    #[arg(long)]
    pub correction: Option<CorrectionKind>,

    /// Wall-clock limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
}

/// Parses environment variable `name` when present.
fn env_value<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::InvalidEnv {
                name: name.to_string(),
                value: raw,
            }),
    }
}

impl PricingConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::ConfigFile(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CliError::ConfigFile(format!("Failed to parse TOML: {}", e)))
    }

    /// Build configuration from all sources
    pub fn load(path: Option<&Path>, overrides: &PriceOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.merge_with_cli(overrides);
        Ok(config)
    }

    /// Applies `MCSIM_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env_value(&lookup, "MCSIM_SPOT")? {
            self.market.spot = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_RATE")? {
            self.market.rate = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_DIVIDEND")? {
            self.market.dividend = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_VOLATILITY")? {
            self.market.volatility = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_STRIKE")? {
            self.option.strike = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_CASH")? {
            self.option.cash = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_STEPS_PER_YEAR")? {
            self.engine.steps_per_year = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_ANTITHETIC")? {
            self.engine.antithetic = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_TOLERANCE")? {
            self.engine.set_tolerance(v);
        }
        if let Some(v) = env_value(&lookup, "MCSIM_SAMPLES")? {
            self.engine.set_samples(v);
        }
        if let Some(v) = env_value(&lookup, "MCSIM_MAX_SAMPLES")? {
            self.engine.max_samples = Some(v);
        }
        if let Some(v) = env_value(&lookup, "MCSIM_SEED")? {
            self.engine.seed = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_SHARDS")? {
            self.engine.shards = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_STREAM")? {
            self.engine.random_stream = v;
        }
        if let Some(v) = env_value(&lookup, "MCSIM_CORRECTION")? {
            self.engine.correction = v;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &PriceOverrides) {
        if let Some(spot) = cli.spot {
            self.market.spot = spot;
        }
        if let Some(volatility) = cli.volatility {
            self.market.volatility = volatility;
        }
        if let Some(rate) = cli.rate {
            self.market.rate = rate;
        }
        if let Some(option_type) = cli.option_type {
            self.option.option_type = option_type;
        }
        if let Some(strike) = cli.strike {
            self.option.strike = strike;
        }
        if let Some(latest) = cli.latest {
            self.option.latest = Some(latest);
            self.option.expiry = None;
        }
        if let Some(samples) = cli.samples {
            self.engine.set_samples(samples);
        }
        if let Some(tolerance) = cli.tolerance {
            self.engine.set_tolerance(tolerance);
        }
        if let Some(cap) = cli.max_samples {
            self.engine.max_samples = Some(cap);
        }
        if let Some(seed) = cli.seed {
            self.engine.seed = seed;
        }
        if let Some(shards) = cli.shards {
            self.engine.shards = shards;
        }
        if let Some(steps) = cli.steps_per_year {
            self.engine.steps_per_year = steps;
        }
        if cli.antithetic {
            self.engine.antithetic = true;
        }
        if let Some(reference) = cli.control_reference {
            self.engine.control_variate = true;
            self.engine.control_reference = Some(reference);
        }
        if let Some(stream) = cli.stream {
            self.engine.random_stream = stream;
        }
        if let Some(correction) = cli.correction {
            self.engine.correction = correction;
        }
        if let Some(limit) = cli.time_limit {
            self.engine.time_limit = Some(limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mcsim_core::SimulationError;
    use mcsim_engine::convergence::ConvergenceCriterion;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PricingConfig::default();
        assert_eq!(config.market.spot, 100.0);
        assert_eq!(config.option.option_type, OptionType::Call);
        assert_eq!(config.engine.steps_per_year, 52);
        assert_eq!(config.engine.shards, 1);
        assert_eq!(config.engine.tolerance, None);
        assert_eq!(config.engine.samples, None);
    }

    #[test]
    fn test_missing_criterion_rejected() {
        let config = PricingConfig::from_toml("[engine]\nseed = 1\n").unwrap();
        let result = config.engine.engine_config();
        assert!(matches!(
            result,
            Err(CliError::Simulation(SimulationError::Configuration(_)))
        ));

        let settings = EngineSettings {
            random_stream: RandomStreamKind::LowDiscrepancy,
            ..Default::default()
        };
        assert!(settings.engine_config().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config = PricingConfig::from_toml(
            r#"
            [market]
            spot = 95.0
            volatility = 0.3

            [option]
            type = "put"
            strike = 90.0
            earliest = 0.25
            latest = 0.75

            [engine]
            steps_per_year = 24
            antithetic = true
            samples = 5000
            random_stream = "low_discrepancy"
            correction = "none"
            "#,
        )
        .unwrap();

        assert_eq!(config.market.spot, 95.0);
        assert_eq!(config.market.rate, 0.0);
        assert_eq!(config.option.option_type, OptionType::Put);
        assert_eq!(
            config.option.exercise().unwrap(),
            Exercise::American {
                earliest: 0.25,
                latest: 0.75
            }
        );
        assert!(config.engine.antithetic);
        assert_eq!(config.engine.random_stream, RandomStreamKind::LowDiscrepancy);
        assert_eq!(config.engine.correction, CorrectionKind::None);
        assert_eq!(
            config.engine.engine_config().unwrap().criterion(),
            ConvergenceCriterion::FixedSamples(5000)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = PricingConfig::from_toml("[market]\nspott = 1.0\n");
        assert!(matches!(result, Err(CliError::ConfigFile(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PricingConfig::from_file(Path::new("/nonexistent/mcsim.toml"));
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[test]
    fn test_expiry_date() {
        let config = PricingConfig::from_toml(
            r#"
            [option]
            valuation_date = "2026-01-01"
            expiry = "2026-07-02"
            day_count = "ACT/365F"
            "#,
        )
        .unwrap();
        let exercise = config.option.exercise().unwrap();
        assert_relative_eq!(exercise.last_date(), 182.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expiry_without_valuation_date() {
        let option = OptionConfig {
            expiry: NaiveDate::from_ymd_opt(2027, 1, 1),
            ..Default::default()
        };
        assert!(matches!(
            option.exercise(),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = PricingConfig::from_toml("[engine]\nsamples = 1000\nseed = 1\n").unwrap();
        config
            .apply_env(lookup(&[
                ("MCSIM_SEED", "7"),
                ("MCSIM_TOLERANCE", "0.002"),
                ("MCSIM_STREAM", "halton"),
            ]))
            .unwrap();
        assert_eq!(config.engine.seed, 7);
        assert_eq!(config.engine.tolerance, Some(0.002));
        assert_eq!(config.engine.samples, None);
        assert_eq!(config.engine.random_stream, RandomStreamKind::LowDiscrepancy);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = PricingConfig::default();
        let result = config.apply_env(lookup(&[("MCSIM_SHARDS", "four")]));
        match result {
            Err(CliError::InvalidEnv { name, value }) => {
                assert_eq!(name, "MCSIM_SHARDS");
                assert_eq!(value, "four");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = PricingConfig::default();
        config
            .apply_env(lookup(&[("MCSIM_SPOT", "90"), ("MCSIM_SAMPLES", "100")]))
            .unwrap();
        config.merge_with_cli(&PriceOverrides {
            spot: Some(105.0),
            tolerance: Some(0.01),
            antithetic: true,
            ..Default::default()
        });
        assert_eq!(config.market.spot, 105.0);
        assert_eq!(config.engine.tolerance, Some(0.01));
        assert_eq!(config.engine.samples, None);
        assert!(config.engine.antithetic);
    }

    #[test]
    fn test_cli_latest_replaces_expiry() {
        let mut config = PricingConfig::from_toml(
            "[option]\nvaluation_date = \"2026-01-01\"\nexpiry = \"2027-01-01\"\n",
        )
        .unwrap();
        config.merge_with_cli(&PriceOverrides {
            latest: Some(0.5),
            ..Default::default()
        });
        assert_eq!(config.option.exercise().unwrap().last_date(), 0.5);
    }

    #[test]
    fn test_time_limit() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.time_limit().unwrap(), None);
        settings.time_limit = Some(1.5);
        assert_eq!(
            settings.time_limit().unwrap(),
            Some(Duration::from_millis(1500))
        );
        settings.time_limit = Some(-1.0);
        assert!(settings.time_limit().is_err());
    }
}
