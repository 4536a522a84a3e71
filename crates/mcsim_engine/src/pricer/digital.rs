//! American cash-or-nothing path pricer with discreteness correction.

use mcsim_core::{SimulationError, TimeGrid};

use super::{
    BarrierSide, BrownianBridgeCorrection, CrossingCorrection, DiscountCurve, Exercise,
    PathPricer, Payoff,
};
use crate::path::Path;
use crate::process::Process;
use crate::rng::{UniformSequence, DEFAULT_AUXILIARY_SEED};

/// Pays a fixed cash amount at the first time the underlying touches the
/// strike within the exercise window, discounted from that time.
///
/// Touches are detected at grid nodes and, through the correction strategy
/// `C`, between nodes. A correction that
/// [uses an auxiliary uniform](CrossingCorrection::uses_auxiliary) draws one
/// vector of `grid.intervals()` uniforms per evaluated path from a sequence
/// of its own, never from the path-generation stream.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::path::Path;
/// use mcsim_engine::pricer::{DigitalPathPricer, Exercise, FlatForward, OptionType, PathPricer, Payoff};
/// use mcsim_engine::process::BlackScholesProcess;
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 1).unwrap());
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
/// let payoff = Payoff::CashOrNothing { option_type: OptionType::Call, strike: 105.0, cash: 1.0 };
/// let exercise = Exercise::American { earliest: 0.0, latest: 1.0 };
///
/// let mut pricer =
///     DigitalPathPricer::new(payoff, exercise, process, &FlatForward::new(0.0), &grid).unwrap();
/// let path = Path::from_values(grid, vec![100.0, 106.0, 99.0]).unwrap();
/// assert_eq!(pricer.evaluate(&path), 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct DigitalPathPricer<P, C = BrownianBridgeCorrection> {
    process: P,
    side: BarrierSide,
    barrier: f64,
    log_barrier: f64,
    cash: f64,
    first: usize,
    last: usize,
    discounts: Vec<f64>,
    correction: C,
    auxiliary: UniformSequence,
}

impl<P: Process> DigitalPathPricer<P, BrownianBridgeCorrection> {
    /// Creates a bridge-corrected pricer.
    ///
    /// # Errors
    ///
    /// - `Configuration("wrong payoff given")` unless the payoff is
    ///   cash-or-nothing
    /// - `Configuration("wrong exercise given")` unless the exercise is
    ///   American
    /// - `InputValidation` for invalid payoff or exercise values
    /// - `Consistency` if an exercise date is not a grid point
    pub fn new<D: DiscountCurve + ?Sized>(
        payoff: Payoff,
        exercise: Exercise,
        process: P,
        curve: &D,
        grid: &TimeGrid,
    ) -> Result<Self, SimulationError> {
        let (option_type, strike, cash) = match payoff {
            Payoff::CashOrNothing {
                option_type,
                strike,
                cash,
            } => (option_type, strike, cash),
            Payoff::PlainVanilla { .. } => {
                return Err(SimulationError::configuration("wrong payoff given"))
            }
        };
        let (earliest, latest) = match exercise {
            Exercise::American { earliest, latest } => (earliest, latest),
            Exercise::European { .. } => {
                return Err(SimulationError::configuration("wrong exercise given"))
            }
        };
        payoff.validate()?;
        exercise.validate()?;

        let last = grid.find_index(latest)?;
        let first = if earliest > 0.0 {
            grid.find_index(earliest)?
        } else {
            0
        };

        Ok(Self {
            process,
            side: option_type.into(),
            barrier: strike,
            log_barrier: strike.ln(),
            cash,
            first,
            last,
            discounts: grid.times().iter().map(|&t| curve.discount(t)).collect(),
            correction: BrownianBridgeCorrection,
            auxiliary: UniformSequence::new(grid.intervals(), DEFAULT_AUXILIARY_SEED),
        })
    }
}

impl<P: Process, C: CrossingCorrection> DigitalPathPricer<P, C> {
    /// Replaces the correction strategy.
    pub fn with_correction<C2: CrossingCorrection>(self, correction: C2) -> DigitalPathPricer<P, C2> {
        DigitalPathPricer {
            process: self.process,
            side: self.side,
            barrier: self.barrier,
            log_barrier: self.log_barrier,
            cash: self.cash,
            first: self.first,
            last: self.last,
            discounts: self.discounts,
            correction,
            auxiliary: self.auxiliary,
        }
    }

    /// Reseeds the auxiliary uniform sequence.
    pub fn with_auxiliary_seed(mut self, seed: u64) -> Self {
        self.auxiliary = UniformSequence::new(self.auxiliary.dimension(), seed);
        self
    }

    /// Returns the correction strategy.
    pub fn correction(&self) -> &C {
        &self.correction
    }

    /// Returns the barrier level.
    pub fn barrier(&self) -> f64 {
        self.barrier
    }
}

impl<P: Process, C: CrossingCorrection> PathPricer for DigitalPathPricer<P, C> {
    fn evaluate(&mut self, path: &Path) -> f64 {
        let uniforms = if self.correction.uses_auxiliary() {
            Some(self.auxiliary.next_sequence())
        } else {
            None
        };

        if self.side.is_hit(path[self.first], self.barrier) {
            return self.cash * self.discounts[self.first];
        }

        for i in self.first..self.last {
            let (x, y) = (path[i], path[i + 1]);
            if self.side.is_hit(y, self.barrier) {
                return self.cash * self.discounts[i + 1];
            }
            if let Some(u) = uniforms {
                if x > 0.0 && y > 0.0 {
                    let t = path.time(i);
                    let sigma = self.process.log_volatility(t, x);
                    let variance = sigma * sigma * (path.time(i + 1) - t);
                    // u lies in [0, 1); the bridge needs (0, 1]
                    let crossed = self.correction.crossed_between(
                        self.side,
                        x.ln(),
                        y.ln(),
                        self.log_barrier,
                        variance,
                        1.0 - u[i],
                    );
                    if crossed {
                        return self.cash * self.discounts[i + 1];
                    }
                }
            }
        }
        0.0
    }
}
