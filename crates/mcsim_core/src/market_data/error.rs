//! Market data error types.

use crate::types::InterpolationError;
use thiserror::Error;

/// Market data operation errors.
///
/// # Variants
///
/// - `DimensionMismatch`: Quote matrix shape does not match its axes
/// - `InsufficientData`: Not enough axis points for construction
/// - `InvalidQuote`: A quote holds a negative or non-finite volatility
/// - `InvalidMaturity`: Lookup at a negative time
/// - `Interpolation`: Wrapped interpolation error
///
/// # Examples
///
/// ```
/// use mcsim_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Quote matrix dimension does not match the axis length.
    #[error("Dimension mismatch in {what}: got {got}, expected {expected}")]
    DimensionMismatch {
        /// Which dimension was checked
        what: &'static str,
        /// Size supplied
        got: usize,
        /// Size required
        expected: usize,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Quote value unusable as a volatility.
    #[error("Invalid volatility quote {value} at ({row}, {column})")]
    InvalidQuote {
        /// Option-time index
        row: usize,
        /// Strike index
        column: usize,
        /// Offending value
        value: f64,
    },

    /// Invalid maturity (negative time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Interpolation error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = MarketDataError::DimensionMismatch {
            what: "volatility rows",
            got: 2,
            expected: 3,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in volatility rows: got 2, expected 3"
        );
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: MarketDataError = InterpolationError::NonMonotonicData { index: 1 }.into();
        assert!(matches!(err, MarketDataError::Interpolation(_)));
    }
}
