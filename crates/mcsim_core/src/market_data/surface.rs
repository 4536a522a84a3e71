//! Volatility surfaces.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::error::MarketDataError;
use super::quote::{QuoteHandle, SimpleQuote};
use crate::math::BilinearInterpolator;
use crate::types::{InterpolationError, Time};

/// Volatility lookup by option time and strike.
///
/// # Contract
///
/// - `volatility(t, strike)` returns a non-negative volatility for `t >= 0`
/// - `time_domain()` and `strike_domain()` report the range backed by data;
///   implementations extrapolate flat outside it
pub trait VolatilitySurface: Send + Sync {
    /// Returns the volatility for option time `t` and `strike`.
    ///
    /// # Errors
    ///
    /// `InvalidMaturity` if `t` is negative or not a number; implementation
    /// specific errors otherwise.
    fn volatility(&self, t: Time, strike: f64) -> Result<f64, MarketDataError>;

    /// Returns the range of option times backed by data.
    fn time_domain(&self) -> (Time, Time);

    /// Returns the range of strikes backed by data.
    fn strike_domain(&self) -> (f64, f64);
}

/// Constant volatility for every time and strike.
///
/// # Example
///
/// ```
/// use mcsim_core::market_data::{FlatVolatility, VolatilitySurface};
///
/// let surface = FlatVolatility::new(0.20);
/// assert_eq!(surface.volatility(0.5, 80.0).unwrap(), 0.20);
/// assert_eq!(surface.volatility(2.0, 120.0).unwrap(), 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVolatility {
    sigma: f64,
}

impl FlatVolatility {
    /// Creates a flat surface.
    #[inline]
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    /// Returns the constant volatility.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl VolatilitySurface for FlatVolatility {
    fn volatility(&self, t: Time, _strike: f64) -> Result<f64, MarketDataError> {
        check_time(t)?;
        Ok(self.sigma)
    }

    fn time_domain(&self) -> (Time, Time) {
        (0.0, f64::INFINITY)
    }

    fn strike_domain(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }
}

/// Grid of volatility quotes by option time (rows) and strike (columns).
///
/// The bilinear interpolation of the quotes is built on first use and
/// cached. Quote updates do not reach the surface by themselves: after
/// changing quotes, call [`QuotedVolSurface::invalidate`] and the next
/// lookup rebuilds the interpolation from a fresh snapshot. Lookups outside
/// the grid extrapolate flat.
///
/// Shape checks happen at construction; quote values are checked on each
/// rebuild.
///
/// # Example
///
/// ```
/// use mcsim_core::market_data::{QuotedVolSurface, VolatilitySurface};
///
/// let surface = QuotedVolSurface::from_values(
///     vec![0.5, 1.0],
///     vec![90.0, 110.0],
///     vec![vec![0.22, 0.18], vec![0.24, 0.20]],
/// )
/// .unwrap();
///
/// assert!((surface.volatility(0.75, 100.0).unwrap() - 0.21).abs() < 1e-12);
///
/// surface.quote(0, 0).unwrap().set_value(0.30);
/// surface.invalidate();
/// assert!((surface.volatility(0.5, 90.0).unwrap() - 0.30).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct QuotedVolSurface {
    option_times: Vec<Time>,
    strikes: Vec<f64>,
    quotes: Vec<Vec<QuoteHandle>>,
    cache: RwLock<Option<Arc<BilinearInterpolator<f64>>>>,
    dirty: AtomicBool,
    recalculations: AtomicUsize,
}

impl QuotedVolSurface {
    /// Creates a surface over shared quote handles.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if fewer than two option times or strikes
    /// - `Interpolation(NonMonotonicData)` if an axis is not strictly increasing
    /// - `DimensionMismatch` if the quote matrix does not have one row per
    ///   option time and one column per strike
    pub fn new(
        option_times: Vec<Time>,
        strikes: Vec<f64>,
        quotes: Vec<Vec<QuoteHandle>>,
    ) -> Result<Self, MarketDataError> {
        for axis in [&option_times, &strikes] {
            if axis.len() < 2 {
                return Err(MarketDataError::InsufficientData {
                    got: axis.len(),
                    need: 2,
                });
            }
            if let Some(i) = axis
                .windows(2)
                .position(|w| !w[0].is_finite() || !w[1].is_finite() || w[1] <= w[0]) {
                return Err(InterpolationError::NonMonotonicData { index: i + 1 }.into());
            }
        }
        if option_times[0] < 0.0 {
            return Err(MarketDataError::InvalidMaturity { t: option_times[0] });
        }
        check_inputs(&quotes, option_times.len(), strikes.len())?;

        Ok(Self {
            option_times,
            strikes,
            quotes,
            cache: RwLock::new(None),
            dirty: AtomicBool::new(true),
            recalculations: AtomicUsize::new(0),
        })
    }

    /// Creates a surface owning fresh quotes initialised from `values`.
    pub fn from_values(
        option_times: Vec<Time>,
        strikes: Vec<f64>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, MarketDataError> {
        let quotes = values
            .into_iter()
            .map(|row| row.into_iter().map(SimpleQuote::handle).collect())
            .collect();
        Self::new(option_times, strikes, quotes)
    }

    /// Returns the quote at `(row, column)`.
    pub fn quote(&self, row: usize, column: usize) -> Option<&QuoteHandle> {
        self.quotes.get(row).and_then(|r| r.get(column))
    }

    /// Returns the option times.
    #[inline]
    pub fn option_times(&self) -> &[Time] {
        &self.option_times
    }

    /// Returns the strikes.
    #[inline]
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    /// Marks the cached interpolation stale.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns how many times the interpolation has been rebuilt.
    pub fn recalculation_count(&self) -> usize {
        self.recalculations.load(Ordering::Acquire)
    }

    fn interpolation(&self) -> Result<Arc<BilinearInterpolator<f64>>, MarketDataError> {
        if !self.dirty.load(Ordering::Acquire) {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(interp) = cache.as_ref() {
                return Ok(Arc::clone(interp));
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if !self.dirty.swap(false, Ordering::AcqRel) {
            // Another reader rebuilt while we waited for the lock.
            if let Some(interp) = cache.as_ref() {
                return Ok(Arc::clone(interp));
            }
        }

        let interp = match self.snapshot() {
            Ok(interp) => Arc::new(interp),
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                return Err(e);
            }
        };
        *cache = Some(Arc::clone(&interp));
        self.recalculations.fetch_add(1, Ordering::AcqRel);
        Ok(interp)
    }

    fn snapshot(&self) -> Result<BilinearInterpolator<f64>, MarketDataError> {
        let mut values = Vec::with_capacity(self.quotes.len());
        for (row, quotes) in self.quotes.iter().enumerate() {
            let mut line = Vec::with_capacity(quotes.len());
            for (column, quote) in quotes.iter().enumerate() {
                let value = quote.value();
                if !value.is_finite() || value < 0.0 {
                    return Err(MarketDataError::InvalidQuote { row, column, value });
                }
                line.push(value);
            }
            values.push(line);
        }
        BilinearInterpolator::new(&self.option_times, &self.strikes, values)
            .map_err(MarketDataError::from)
    }
}

impl VolatilitySurface for QuotedVolSurface {
    fn volatility(&self, t: Time, strike: f64) -> Result<f64, MarketDataError> {
        check_time(t)?;
        Ok(self.interpolation()?.interpolate_flat(t, strike))
    }

    fn time_domain(&self) -> (Time, Time) {
        (self.option_times[0], self.option_times[self.option_times.len() - 1])
    }

    fn strike_domain(&self) -> (f64, f64) {
        (self.strikes[0], self.strikes[self.strikes.len() - 1])
    }
}

fn check_time(t: Time) -> Result<(), MarketDataError> {
    if t.is_nan() || t < 0.0 {
        return Err(MarketDataError::InvalidMaturity { t });
    }
    Ok(())
}

fn check_inputs(
    quotes: &[Vec<QuoteHandle>],
    rows: usize,
    columns: usize,
) -> Result<(), MarketDataError> {
    if quotes.len() != rows {
        return Err(MarketDataError::DimensionMismatch {
            what: "volatility rows",
            got: quotes.len(),
            expected: rows,
        });
    }
    for row in quotes {
        if row.len() != columns {
            return Err(MarketDataError::DimensionMismatch {
                what: "volatility columns",
                got: row.len(),
                expected: columns,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn surface() -> QuotedVolSurface {
        QuotedVolSurface::from_values(
            vec![0.25, 1.0, 2.0],
            vec![80.0, 100.0, 120.0],
            vec![
                vec![0.30, 0.25, 0.28],
                vec![0.27, 0.22, 0.24],
                vec![0.25, 0.20, 0.21],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_volatility() {
        let flat = FlatVolatility::new(0.15);
        assert_eq!(flat.volatility(3.0, 1.0).unwrap(), 0.15);
        assert!(matches!(
            flat.volatility(-0.1, 1.0),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }

    #[test]
    fn test_nodes_reproduced() {
        let s = surface();
        assert_relative_eq!(s.volatility(1.0, 100.0).unwrap(), 0.22, epsilon = 1e-14);
        assert_relative_eq!(s.volatility(2.0, 120.0).unwrap(), 0.21, epsilon = 1e-14);
    }

    #[test]
    fn test_flat_extrapolation() {
        let s = surface();
        assert_relative_eq!(s.volatility(0.0, 50.0).unwrap(), 0.30, epsilon = 1e-14);
        assert_relative_eq!(s.volatility(5.0, 150.0).unwrap(), 0.21, epsilon = 1e-14);
    }

    #[test]
    fn test_lazy_build_and_cache() {
        let s = surface();
        assert_eq!(s.recalculation_count(), 0);
        s.volatility(1.0, 100.0).unwrap();
        s.volatility(1.5, 90.0).unwrap();
        assert_eq!(s.recalculation_count(), 1);
    }

    #[test]
    fn test_quote_update_needs_invalidate() {
        let s = surface();
        assert_relative_eq!(s.volatility(1.0, 100.0).unwrap(), 0.22, epsilon = 1e-14);

        s.quote(1, 1).unwrap().set_value(0.40);
        assert_relative_eq!(s.volatility(1.0, 100.0).unwrap(), 0.22, epsilon = 1e-14);

        s.invalidate();
        assert_relative_eq!(s.volatility(1.0, 100.0).unwrap(), 0.40, epsilon = 1e-14);
        assert_eq!(s.recalculation_count(), 2);
    }

    #[test]
    fn test_shared_quote_handles() {
        let q = SimpleQuote::handle(0.2);
        let quotes = vec![
            vec![Arc::clone(&q), SimpleQuote::handle(0.2)],
            vec![SimpleQuote::handle(0.2), SimpleQuote::handle(0.2)],
        ];
        let s = QuotedVolSurface::new(vec![0.5, 1.0], vec![90.0, 110.0], quotes).unwrap();
        q.set_value(0.6);
        s.invalidate();
        assert_relative_eq!(s.volatility(0.5, 90.0).unwrap(), 0.6, epsilon = 1e-14);
    }

    #[test]
    fn test_row_count_mismatch() {
        let result = QuotedVolSurface::from_values(
            vec![0.5, 1.0, 2.0],
            vec![90.0, 110.0],
            vec![vec![0.2, 0.2], vec![0.2, 0.2]],
        );
        assert_eq!(
            result.unwrap_err(),
            MarketDataError::DimensionMismatch {
                what: "volatility rows",
                got: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn test_column_count_mismatch() {
        let result = QuotedVolSurface::from_values(
            vec![0.5, 1.0],
            vec![90.0, 110.0],
            vec![vec![0.2, 0.2], vec![0.2]],
        );
        assert!(matches!(
            result,
            Err(MarketDataError::DimensionMismatch {
                what: "volatility columns",
                ..
            })
        ));
    }

    #[test]
    fn test_unsorted_axis_rejected() {
        let result = QuotedVolSurface::from_values(
            vec![1.0, 0.5],
            vec![90.0, 110.0],
            vec![vec![0.2, 0.2], vec![0.2, 0.2]],
        );
        assert!(matches!(result, Err(MarketDataError::Interpolation(_))));
    }

    #[test]
    fn test_invalid_quote_reported_and_recoverable() {
        let s = surface();
        s.quote(0, 2).unwrap().set_value(f64::NAN);
        assert!(matches!(
            s.volatility(1.0, 100.0),
            Err(MarketDataError::InvalidQuote { row: 0, column: 2, .. })
        ));

        s.quote(0, 2).unwrap().set_value(0.28);
        assert!(s.volatility(1.0, 100.0).is_ok());
    }
}
