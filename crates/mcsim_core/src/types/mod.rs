//! Core error and time types.
//!
//! This module provides:
//! - `error`: Structured error types for configuration, grid consistency,
//!   input validation and interpolation failures
//! - `time`: Day-count conventions turning calendar dates into year fractions
//!
//! # Re-exports
//!
//! - [`SimulationError`], [`InterpolationError`] from `error`
//! - [`DayCountConvention`], [`mandatory_times`] from `time`

pub mod error;
pub mod time;

pub use error::{InterpolationError, SimulationError};
pub use time::{mandatory_times, DayCountConvention};

/// Time measured in years from the valuation reference date.
pub type Time = f64;
