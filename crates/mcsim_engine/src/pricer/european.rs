//! Terminal-payoff path pricer.

use mcsim_core::{SimulationError, TimeGrid};

use super::{DiscountCurve, Exercise, PathPricer, Payoff};
use crate::path::Path;

/// Discounted payoff of the path value at a European exercise date.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::path::Path;
/// use mcsim_engine::pricer::{
///     EuropeanPathPricer, Exercise, FlatForward, OptionType, PathPricer, Payoff,
/// };
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 1).unwrap());
/// let payoff = Payoff::PlainVanilla { option_type: OptionType::Call, strike: 100.0 };
/// let mut pricer = EuropeanPathPricer::new(
///     payoff,
///     Exercise::European { date: 1.0 },
///     &FlatForward::new(0.0),
///     &grid,
/// )
/// .unwrap();
///
/// let path = Path::from_values(grid, vec![100.0, 95.0, 112.0]).unwrap();
/// assert_eq!(pricer.evaluate(&path), 12.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EuropeanPathPricer {
    payoff: Payoff,
    index: usize,
    discount: f64,
}

impl EuropeanPathPricer {
    /// Creates a pricer for `payoff` exercised on `exercise`.
    ///
    /// # Errors
    ///
    /// - `Configuration("wrong exercise given")` for non-European exercise
    /// - `InputValidation` for an invalid payoff or exercise date
    /// - `Consistency` if the exercise date is not a grid point
    pub fn new<D: DiscountCurve + ?Sized>(
        payoff: Payoff,
        exercise: Exercise,
        curve: &D,
        grid: &TimeGrid,
    ) -> Result<Self, SimulationError> {
        let date = match exercise {
            Exercise::European { date } => date,
            Exercise::American { .. } => {
                return Err(SimulationError::configuration("wrong exercise given"))
            }
        };
        payoff.validate()?;
        exercise.validate()?;
        let index = grid.find_index(date)?;
        Ok(Self {
            payoff,
            index,
            discount: curve.discount(date),
        })
    }

    /// Returns the payoff.
    pub fn payoff(&self) -> &Payoff {
        &self.payoff
    }

    /// Returns the discount factor of the exercise date.
    pub fn discount(&self) -> f64 {
        self.discount
    }
}

impl PathPricer for EuropeanPathPricer {
    #[inline]
    fn evaluate(&mut self, path: &Path) -> f64 {
        self.payoff.value(path[self.index]) * self.discount
    }
}
