//! Time discretisation of a pricing horizon.
//!
//! A [`TimeGrid`] contains every mandatory event time bit-for-bit and fills
//! the gaps between consecutive event times with equally spaced sub-steps no
//! longer than `horizon / steps`.
//!
//! # Construction
//!
//! ```text
//! dt_max = horizon / steps
//! begin  = 0
//! for end in mandatory:
//!     if end == begin: skip
//!     n  = floor((end - begin) / dt_max + 1)
//!     dt = (end - begin) / n
//!     push begin + k * dt  for k in 0..n
//!     begin = end
//! push begin
//! ```
//!
//! # Example
//!
//! ```rust
//! use mcsim_core::time_grid::TimeGrid;
//!
//! let grid = TimeGrid::new(&[1.0, 2.0, 3.0], 6).unwrap();
//!
//! assert_eq!(grid.len(), 10);
//! assert_eq!(grid[0], 0.0);
//! assert_eq!(grid[3], 1.0);
//! assert_eq!(grid.horizon(), 3.0);
//! ```

use serde::Serialize;
use std::ops::Index;

use crate::types::{SimulationError, Time};

/// Largest step budget a grid accepts.
pub const MAX_STEPS: usize = 10_000_000;

/// Ordered, strictly increasing discretisation of `[0, horizon]`.
///
/// Immutable once built; shared between path generation and payoff
/// evaluation for the duration of one calculation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeGrid {
    /// Grid points, starting at 0 and ending at the horizon.
    times: Vec<Time>,
    /// Mandatory times as supplied by the caller.
    mandatory: Vec<Time>,
}

impl TimeGrid {
    /// Builds a grid from ascending mandatory times and a step budget.
    ///
    /// # Arguments
    ///
    /// * `mandatory` - Ascending event times; the last one is the horizon
    /// * `steps` - Target number of steps over the whole horizon
    ///
    /// # Errors
    ///
    /// - `Configuration` if `steps` is zero or above [`MAX_STEPS`],
    ///   `mandatory` is empty, or the horizon is not positive
    /// - `InputValidation` if a time is negative, non-finite or out of order
    pub fn new(mandatory: &[Time], steps: usize) -> Result<Self, SimulationError> {
        if steps == 0 {
            return Err(SimulationError::configuration(
                "time grid requires at least one step",
            ));
        }
        if steps > MAX_STEPS {
            return Err(SimulationError::configuration(format!(
                "time grid step count {} exceeds the maximum of {}",
                steps, MAX_STEPS
            )));
        }
        let horizon = match mandatory.last() {
            Some(&h) => h,
            None => {
                return Err(SimulationError::configuration(
                    "time grid requires at least one mandatory time",
                ))
            }
        };

        let mut previous = 0.0;
        for (i, &t) in mandatory.iter().enumerate() {
            if !t.is_finite() || t < 0.0 {
                return Err(SimulationError::input(format!(
                    "mandatory time {} at position {} is not a non-negative finite number",
                    t, i
                )));
            }
            if t < previous {
                return Err(SimulationError::input(format!(
                    "mandatory times not ascending at position {}: {} < {}",
                    i, t, previous
                )));
            }
            previous = t;
        }
        if horizon <= 0.0 {
            return Err(SimulationError::configuration(
                "time grid horizon must be positive",
            ));
        }

        let dt_max = horizon / steps as f64;
        let mut times = Vec::with_capacity(steps.saturating_add(mandatory.len()).saturating_add(1));
        let mut begin: Time = 0.0;

        for &end in mandatory {
            if end == begin {
                continue;
            }
            let n_steps = ((end - begin) / dt_max + 1.0).floor() as usize;
            let dt = (end - begin) / n_steps as f64;
            times.extend((0..n_steps).map(|k| begin + k as f64 * dt));
            begin = end;
        }
        times.push(begin);

        Ok(Self {
            times,
            mandatory: mandatory.to_vec(),
        })
    }

    /// Builds a grid over `[0, horizon]` with `steps` equal steps.
    pub fn from_horizon(horizon: Time, steps: usize) -> Result<Self, SimulationError> {
        Self::new(&[horizon], steps)
    }

    /// Returns the index of the grid point exactly equal to `t`.
    ///
    /// # Errors
    ///
    /// `SimulationError::Consistency` if `t` is not a grid point. Only
    /// mandatory times, or times known to be grid-aligned, may be queried.
    pub fn find_index(&self, t: Time) -> Result<usize, SimulationError> {
        self.times
            .iter()
            .position(|&x| x == t)
            .ok_or(SimulationError::Consistency { time: t })
    }

    /// Returns the length of interval `i`, `grid[i + 1] - grid[i]`.
    ///
    /// # Errors
    ///
    /// `SimulationError::IndexOutOfRange` if `i` is the last index or beyond.
    pub fn dt(&self, i: usize) -> Result<Time, SimulationError> {
        match (self.times.get(i), self.times.get(i + 1)) {
            (Some(&a), Some(&b)) => Ok(b - a),
            _ => Err(SimulationError::IndexOutOfRange {
                index: i,
                len: self.times.len(),
            }),
        }
    }

    /// Returns the number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the grid has no points. A constructed grid always has at least two.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the number of intervals, `len() - 1`.
    #[inline]
    pub fn intervals(&self) -> usize {
        self.times.len().saturating_sub(1)
    }

    /// Returns the last grid point.
    #[inline]
    pub fn horizon(&self) -> Time {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Returns the grid points.
    #[inline]
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Returns the mandatory times the grid was built from.
    #[inline]
    pub fn mandatory_times(&self) -> &[Time] {
        &self.mandatory
    }

    /// Iterates over the interval lengths.
    pub fn dts(&self) -> impl Iterator<Item = Time> + '_ {
        self.times.windows(2).map(|w| w[1] - w[0])
    }
}

impl Index<usize> for TimeGrid {
    type Output = Time;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.times[index]
    }
}
