//! Monte Carlo engine for American cash-or-nothing options.
//!
//! [`DigitalEngine`] wires the pieces together for one calculation:
//!
//! 1. builds a [`TimeGrid`] over the exercise window with
//!    `max(floor(T * steps_per_year), 1)` steps,
//! 2. creates one path generator and one [`DigitalPathPricer`] per shard,
//!    each with its own random stream and auxiliary sequence,
//! 3. optionally adds the European cash-or-nothing option on the same
//!    payoff as control variate, and
//! 4. runs the configured [`ConvergenceCriterion`](crate::convergence::ConvergenceCriterion)
//!    through a [`ConvergenceController`].

use std::sync::Arc;
use std::time::Duration;

use mcsim_core::{SimulationError, TimeGrid};
use tracing::info;

use crate::config::EngineConfig;
use crate::convergence::{CancellationToken, ConvergenceController, PricingResult};
use crate::model::MonteCarloModel;
use crate::parallel::ShardedModel;
use crate::path::{EulerPathGenerator, PathGenerator};
use crate::pricer::{
    DigitalPathPricer, DiscountCurve, EuropeanPathPricer, Exercise, PathPricer, Payoff,
};
use crate::process::Process;
use crate::rng::{shard_seed, HaltonSequence, PseudoRandom, RandomStream, RandomStreamKind};

/// Index stride between the Halton slices of consecutive shards.
const HALTON_SHARD_STRIDE: u64 = 1 << 40;

/// Prices American cash-or-nothing options by Monte Carlo simulation.
///
/// # Examples
///
/// ```
/// use mcsim_engine::config::EngineConfig;
/// use mcsim_engine::engine::DigitalEngine;
/// use mcsim_engine::pricer::{Exercise, FlatForward, OptionType, Payoff};
/// use mcsim_engine::process::BlackScholesProcess;
///
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
/// let config = EngineConfig::builder()
///     .max_steps_per_year(12)
///     .required_samples(4_000)
///     .seed(7)
///     .build()
///     .unwrap();
/// let engine = DigitalEngine::new(process, FlatForward::new(0.0), config);
///
/// let payoff = Payoff::CashOrNothing { option_type: OptionType::Call, strike: 110.0, cash: 1.0 };
/// let exercise = Exercise::American { earliest: 0.0, latest: 1.0 };
/// let result = engine.calculate(&payoff, &exercise).unwrap();
///
/// assert_eq!(result.samples, 4_000);
/// assert!(result.value > 0.5 && result.value < 0.7);
/// ```
#[derive(Clone, Debug)]
pub struct DigitalEngine<P, D> {
    process: P,
    discount: D,
    config: EngineConfig,
    cancellation: Option<CancellationToken>,
    time_limit: Option<Duration>,
}

impl<P, D> DigitalEngine<P, D>
where
    P: Process + Clone,
    D: DiscountCurve,
{
    /// Creates an engine from a process, a discount curve and a validated
    /// configuration.
    pub fn new(process: P, discount: D, config: EngineConfig) -> Self {
        Self {
            process,
            discount,
            config,
            cancellation: None,
            time_limit: None,
        }
    }

    /// Attaches a cancellation token checked between sampling batches.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Bounds the wall-clock time of each calculation.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the process.
    pub fn process(&self) -> &P {
        &self.process
    }

    /// Builds the time grid of `exercise`.
    ///
    /// Mandatory times are the exercise window's end points; the step
    /// count is `max(floor(T * max_steps_per_year), 1)` for last exercise
    /// time `T`.
    ///
    /// # Errors
    ///
    /// - `InputValidation` for an invalid exercise
    /// - `Configuration` if the step count exceeds
    ///   [`MAX_STEPS`](mcsim_core::time_grid::MAX_STEPS)
    pub fn time_grid(&self, exercise: &Exercise) -> Result<TimeGrid, SimulationError> {
        exercise.validate()?;
        let horizon = exercise.last_date();
        // saturating cast; an oversized count is rejected by the grid
        let steps = ((horizon * self.config.max_steps_per_year() as f64) as usize).max(1);
        TimeGrid::new(&exercise.mandatory_times(), steps)
    }

    /// Prices `payoff` under `exercise`.
    ///
    /// # Errors
    ///
    /// - `Configuration("wrong payoff given")` unless the payoff is
    ///   cash-or-nothing
    /// - `Configuration("wrong exercise given")` unless the exercise is
    ///   American
    /// - `InputValidation` for invalid payoff or exercise values
    ///
    /// Running out of samples or time is not an error: the result
    /// then carries [`ConvergenceStatus::Exhausted`](crate::convergence::ConvergenceStatus::Exhausted).
    pub fn calculate(
        &self,
        payoff: &Payoff,
        exercise: &Exercise,
    ) -> Result<PricingResult, SimulationError> {
        if !matches!(payoff, Payoff::CashOrNothing { .. }) {
            return Err(SimulationError::configuration("wrong payoff given"));
        }
        if !matches!(exercise, Exercise::American { .. }) {
            return Err(SimulationError::configuration("wrong exercise given"));
        }
        let grid = Arc::new(self.time_grid(exercise)?);
        let dimension = grid.intervals();

        info!(
            strike = payoff.strike(),
            horizon = grid.horizon(),
            grid_points = grid.len(),
            shards = self.config.shards(),
            stream = %self.config.random_stream(),
            correction = %self.config.correction(),
            "pricing American cash-or-nothing option"
        );

        match self.config.random_stream() {
            RandomStreamKind::PseudoRandom => {
                let seed = self.config.seed();
                self.price_with(payoff, exercise, &grid, |shard| {
                    PseudoRandom::new(dimension, shard_seed(seed, shard))
                })
            }
            RandomStreamKind::LowDiscrepancy => {
                self.price_with(payoff, exercise, &grid, |shard| {
                    HaltonSequence::with_start_index(dimension, shard as u64 * HALTON_SHARD_STRIDE)
                })
            }
        }
    }

    fn price_with<R, S>(
        &self,
        payoff: &Payoff,
        exercise: &Exercise,
        grid: &Arc<TimeGrid>,
        stream: S,
    ) -> Result<PricingResult, SimulationError>
    where
        R: RandomStream,
        S: Fn(usize) -> R,
    {
        let generator = |shard: usize| {
            EulerPathGenerator::new(self.process.clone(), stream(shard), Arc::clone(grid))
        };
        let digital = |shard: usize| {
            DigitalPathPricer::new(*payoff, *exercise, self.process.clone(), &self.discount, grid)
                .map(|pricer| {
                    pricer
                        .with_correction(self.config.correction())
                        .with_auxiliary_seed(shard_seed(self.config.auxiliary_seed(), shard))
                })
        };

        match (self.config.control_variate(), self.config.control_reference()) {
            (true, Some(reference)) => {
                let european = Exercise::European {
                    date: exercise.last_date(),
                };
                self.drive(|shard| {
                    let control = EuropeanPathPricer::new(*payoff, european, &self.discount, grid)?;
                    MonteCarloModel::builder(generator(shard)?, digital(shard)?)
                        .antithetic(self.config.antithetic())
                        .control_variate(true)
                        .control_pricer(control)
                        .control_reference(reference)
                        .build()
                })
            }
            _ => self.drive(|shard| {
                MonteCarloModel::builder(generator(shard)?, digital(shard)?)
                    .antithetic(self.config.antithetic())
                    .build()
            }),
        }
    }

    fn drive<G, T, C, F>(&self, mut factory: F) -> Result<PricingResult, SimulationError>
    where
        G: PathGenerator,
        T: PathPricer,
        C: PathPricer,
        F: FnMut(usize) -> Result<MonteCarloModel<G, T, C>, SimulationError>,
    {
        let controller = self.controller();
        let criterion = self.config.criterion();
        if self.config.shards() == 1 {
            let mut model = factory(0)?;
            controller.run(&mut model, &criterion)
        } else {
            let mut model = ShardedModel::new(self.config.shards(), factory)?;
            controller.run(&mut model, &criterion)
        }
    }

    fn controller(&self) -> ConvergenceController {
        let mut controller = ConvergenceController::new();
        if let Some(token) = &self.cancellation {
            controller = controller.with_cancellation(token.clone());
        }
        if let Some(limit) = self.time_limit {
            controller = controller.with_time_limit(limit);
        }
        controller
    }
}
