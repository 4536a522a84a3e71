//! Error types for structured error handling.
//!
//! This module provides:
//! - `SimulationError`: Failures of a pricing calculation attempt
//! - `InterpolationError`: Errors from interpolation operations
//!
//! Statistical non-convergence is deliberately absent: a sampling run that
//! hits its cap is reported as a result status, not as an error.

use crate::market_data::MarketDataError;
use thiserror::Error;

/// Categorised errors aborting a pricing calculation.
///
/// # Variants
/// - `Configuration`: Missing or contradictory settings (no convergence
///   criterion, zero step count, incomplete control variate, wrong payoff)
/// - `Consistency`: A time was looked up on a grid it does not belong to
/// - `IndexOutOfRange`: A grid interval index past the last interval
/// - `InputValidation`: Malformed external inputs detected at construction
/// - `MarketData`: Wrapped market data failure
///
/// # Examples
/// ```
/// use mcsim_core::types::SimulationError;
///
/// let err = SimulationError::Configuration("neither tolerance nor number of samples set".into());
/// assert_eq!(
///     format!("{}", err),
///     "Configuration error: neither tolerance nor number of samples set"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Grid lookup for a time that is not a grid element.
    #[error("Consistency error: time {time} is not a grid point")]
    Consistency {
        /// The time that was looked up
        time: f64,
    },

    /// Interval index outside the grid.
    #[error("Consistency error: interval {index} outside grid of {len} points")]
    IndexOutOfRange {
        /// Requested interval index
        index: usize,
        /// Number of grid points
        len: usize,
    },

    /// Malformed external input.
    #[error("Input validation error: {0}")]
    InputValidation(String),

    /// Market data failure.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
}

impl SimulationError {
    /// Shorthand for a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        SimulationError::Configuration(msg.into())
    }

    /// Shorthand for an input validation error.
    pub fn input(msg: impl Into<String>) -> Self {
        SimulationError::InputValidation(msg.into())
    }
}

/// Interpolation-related errors.
///
/// # Examples
/// ```
/// use mcsim_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Axis coordinates are not strictly increasing.
    #[error("Data is not monotonic at index {index}")]
    NonMonotonicData {
        /// Index where monotonicity is violated
        index: usize,
    },

    /// Grid values do not match the axis lengths.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = SimulationError::configuration("zero steps");
        assert_eq!(err.to_string(), "Configuration error: zero steps");
    }

    #[test]
    fn test_consistency_display() {
        let err = SimulationError::Consistency { time: 0.25 };
        assert_eq!(
            err.to_string(),
            "Consistency error: time 0.25 is not a grid point"
        );
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = SimulationError::IndexOutOfRange { index: 9, len: 10 };
        assert!(err.to_string().contains("interval 9"));
    }

    #[test]
    fn test_from_market_data_error() {
        let md = MarketDataError::DimensionMismatch {
            what: "volatility rows",
            got: 2,
            expected: 3,
        };
        let err: SimulationError = md.into();
        assert!(matches!(err, SimulationError::MarketData(_)));
    }

    #[test]
    fn test_interpolation_error_display() {
        let err = InterpolationError::InsufficientData { got: 1, need: 2 };
        assert_eq!(
            err.to_string(),
            "Insufficient data points: got 1, need at least 2"
        );
    }
}
