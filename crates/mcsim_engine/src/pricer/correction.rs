//! Discreteness corrections for barrier monitoring.
//!
//! A path is only observed at grid nodes, so a barrier touched between two
//! nodes goes unseen and a discretely monitored digital is biased low. A
//! [`CrossingCorrection`] decides, given the log-prices at both ends of an
//! interval and the interval's log-variance, whether the continuous path
//! crossed in between.
//!
//! # Brownian bridge
//!
//! Conditional on its end points `x` and `y`, a Brownian motion with
//! variance `v` over the interval has maximum
//!
//! ```text
//! M = (x + y + sqrt((y - x)^2 - 2 v ln u)) / 2
//! ```
//!
//! for `u` uniform on `(0, 1]`, and minimum
//!
//! ```text
//! m = (x + y - sqrt((y - x)^2 - 2 v ln u)) / 2
//! ```
//!
//! so that `P(M >= b) = exp(-2 (b - x)(b - y) / v)` for `b` above both ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::OptionType;

/// Direction from which the barrier is approached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarrierSide {
    /// Barrier above the path; touched when the path rises to it.
    Above,
    /// Barrier below the path; touched when the path falls to it.
    Below,
}

impl BarrierSide {
    /// Returns `true` if `value` is at or beyond `barrier`.
    #[inline]
    pub fn is_hit(&self, value: f64, barrier: f64) -> bool {
        match self {
            BarrierSide::Above => value >= barrier,
            BarrierSide::Below => value <= barrier,
        }
    }
}

impl From<OptionType> for BarrierSide {
    fn from(option_type: OptionType) -> Self {
        match option_type {
            OptionType::Call => BarrierSide::Above,
            OptionType::Put => BarrierSide::Below,
        }
    }
}

/// Strategy deciding whether a barrier was crossed between two nodes.
pub trait CrossingCorrection: Send {
    /// Returns `true` if the correction consumes one auxiliary uniform per
    /// interval.
    fn uses_auxiliary(&self) -> bool;

    /// Returns `true` if the path crossed the barrier strictly between two
    /// nodes at which it was not hit.
    ///
    /// # Arguments
    ///
    /// * `side` - Barrier side
    /// * `x`, `y` - Log-prices at the start and end of the interval
    /// * `log_barrier` - Log of the barrier level
    /// * `variance` - Log-price variance over the interval, `sigma^2 dt`
    /// * `u` - Auxiliary uniform in `(0, 1]`
    fn crossed_between(
        &self,
        side: BarrierSide,
        x: f64,
        y: f64,
        log_barrier: f64,
        variance: f64,
        u: f64,
    ) -> bool;
}

/// Discrete monitoring only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoCorrection;

impl CrossingCorrection for NoCorrection {
    fn uses_auxiliary(&self) -> bool {
        false
    }

    fn crossed_between(&self, _: BarrierSide, _: f64, _: f64, _: f64, _: f64, _: f64) -> bool {
        false
    }
}

/// Samples the extreme of the Brownian bridge between two nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrownianBridgeCorrection;

impl CrossingCorrection for BrownianBridgeCorrection {
    fn uses_auxiliary(&self) -> bool {
        true
    }

    fn crossed_between(
        &self,
        side: BarrierSide,
        x: f64,
        y: f64,
        log_barrier: f64,
        variance: f64,
        u: f64,
    ) -> bool {
        if variance <= 0.0 {
            return false;
        }
        match side {
            BarrierSide::Above => bridge_maximum(x, y, variance, u) >= log_barrier,
            BarrierSide::Below => bridge_minimum(x, y, variance, u) <= log_barrier,
        }
    }
}

/// Returns the bridge maximum between `x` and `y` for uniform `u`.
///
/// # Examples
///
/// ```
/// use mcsim_engine::pricer::bridge_maximum;
///
/// // u = 1 gives the larger end point.
/// assert_eq!(bridge_maximum(0.1, 0.3, 0.04, 1.0), 0.3);
/// assert!(bridge_maximum(0.1, 0.3, 0.04, 0.5) > 0.3);
/// ```
#[inline]
pub fn bridge_maximum(x: f64, y: f64, variance: f64, u: f64) -> f64 {
    let d = y - x;
    0.5 * (x + y + (d * d - 2.0 * variance * u.ln()).sqrt())
}

/// Returns the bridge minimum between `x` and `y` for uniform `u`.
#[inline]
pub fn bridge_minimum(x: f64, y: f64, variance: f64, u: f64) -> f64 {
    let d = y - x;
    0.5 * (x + y - (d * d - 2.0 * variance * u.ln()).sqrt())
}

/// Runtime choice of correction, as read from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// [`NoCorrection`]
    None,
    /// [`BrownianBridgeCorrection`]
    #[default]
    BrownianBridge,
}

impl CrossingCorrection for CorrectionKind {
    fn uses_auxiliary(&self) -> bool {
        match self {
            CorrectionKind::None => NoCorrection.uses_auxiliary(),
            CorrectionKind::BrownianBridge => BrownianBridgeCorrection.uses_auxiliary(),
        }
    }

    fn crossed_between(
        &self,
        side: BarrierSide,
        x: f64,
        y: f64,
        log_barrier: f64,
        variance: f64,
        u: f64,
    ) -> bool {
        match self {
            CorrectionKind::None => false,
            CorrectionKind::BrownianBridge => {
                BrownianBridgeCorrection.crossed_between(side, x, y, log_barrier, variance, u)
            }
        }
    }
}

impl FromStr for CorrectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "none" | "discrete" => Ok(CorrectionKind::None),
            "brownian_bridge" | "bridge" => Ok(CorrectionKind::BrownianBridge),
            _ => Err(format!("Unknown correction: {}", s)),
        }
    }
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionKind::None => write!(f, "none"),
            CorrectionKind::BrownianBridge => write!(f, "brownian_bridge"),
        }
    }
}
