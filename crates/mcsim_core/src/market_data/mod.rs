//! Market data inputs for simulation models.
//!
//! This module provides:
//! - [`SimpleQuote`] / [`QuoteHandle`]: shared, atomically updatable quotes
//! - [`VolatilitySurface`]: volatility lookup by time and strike
//! - [`FlatVolatility`]: constant volatility
//! - [`QuotedVolSurface`]: option-time by strike grid of quotes, interpolated
//!   bilinearly and recalculated lazily after [`QuotedVolSurface::invalidate`]
//! - [`MarketDataError`]: market data failures

mod error;
mod quote;
mod surface;

pub use error::MarketDataError;
pub use quote::{QuoteHandle, SimpleQuote};
pub use surface::{FlatVolatility, QuotedVolSurface, VolatilitySurface};
