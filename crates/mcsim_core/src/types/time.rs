//! Day count conventions for turning calendar dates into simulation times.
//!
//! The simulation core works in year fractions only. This module is the thin
//! conversion layer that produces those fractions from a reference date and
//! the instrument's event dates.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use mcsim_core::types::time::{mandatory_times, DayCountConvention};
//!
//! let reference = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let exercise = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//!
//! let times = mandatory_times(reference, &[exercise], DayCountConvention::Actual365Fixed).unwrap();
//! assert!((times[0] - 366.0 / 365.0).abs() < 1e-12);
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SimulationError;
use super::Time;

/// Day count convention for year fraction calculation.
///
/// # Variants
///
/// - `Actual365Fixed`: actual days / 365
/// - `Actual360`: actual days / 360
/// - `Thirty360`: 30/360 US bond basis
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayCountConvention {
    /// Actual/365 Fixed.
    #[default]
    Actual365Fixed,
    /// Actual/360.
    Actual360,
    /// 30/360 US Bond Basis: every month has 30 days, the year 360.
    Thirty360,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    ///
    /// ```
    /// use mcsim_core::types::DayCountConvention;
    ///
    /// assert_eq!(DayCountConvention::Actual365Fixed.name(), "ACT/365F");
    /// assert_eq!(DayCountConvention::Thirty360.name(), "30/360");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Actual365Fixed => "ACT/365F",
            DayCountConvention::Actual360 => "ACT/360",
            DayCountConvention::Thirty360 => "30/360",
        }
    }

    /// Calculates the signed year fraction between two dates.
    ///
    /// Negative when `start > end`.
    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> Time {
        match self {
            DayCountConvention::Actual365Fixed => (end - start).num_days() as f64 / 365.0,
            DayCountConvention::Actual360 => (end - start).num_days() as f64 / 360.0,
            DayCountConvention::Thirty360 => {
                let (a, b, sign) = if start <= end {
                    (start, end, 1.0)
                } else {
                    (end, start, -1.0)
                };

                let d1 = if a.day() == 31 { 30 } else { a.day() };
                let d2 = if b.day() == 31 && d1 == 30 { 30 } else { b.day() };

                let days = 360 * (b.year() - a.year())
                    + 30 * (b.month() as i32 - a.month() as i32)
                    + (d2 as i32 - d1 as i32);
                sign * days as f64 / 360.0
            }
        }
    }
}

impl FromStr for DayCountConvention {
    type Err = String;

    /// Parses a convention name (case-insensitive, `/` and spaces ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['/', ' '], "").as_str() {
            "ACT365F" | "ACT365" | "ACTUAL365FIXED" | "A365F" => {
                Ok(DayCountConvention::Actual365Fixed)
            }
            "ACT360" | "ACTUAL360" | "A360" => Ok(DayCountConvention::Actual360),
            "30360" | "THIRTY360" => Ok(DayCountConvention::Thirty360),
            _ => Err(format!("Unknown day count convention: {}", s)),
        }
    }
}

impl TryFrom<String> for DayCountConvention {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayCountConvention> for String {
    fn from(value: DayCountConvention) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Converts event dates into ascending, de-duplicated mandatory grid times.
///
/// Dates equal to the reference date map to `0.0` and are kept; the grid
/// builder merges them with its own origin.
///
/// # Errors
///
/// `SimulationError::InputValidation` if `dates` is empty or any date lies
/// before `reference`.
pub fn mandatory_times(
    reference: NaiveDate,
    dates: &[NaiveDate],
    convention: DayCountConvention,
) -> Result<Vec<Time>, SimulationError> {
    if dates.is_empty() {
        return Err(SimulationError::input("no event dates supplied"));
    }

    let mut times = Vec::with_capacity(dates.len());
    for &date in dates {
        if date < reference {
            return Err(SimulationError::input(format!(
                "event date {} precedes reference date {}",
                date, reference
            )));
        }
        times.push(convention.year_fraction(reference, date));
    }

    times.sort_by(|a, b| a.total_cmp(b));
    times.dedup();
    Ok(times)
}
