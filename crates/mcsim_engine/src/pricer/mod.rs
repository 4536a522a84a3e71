//! Path pricers: per-path discounted payoff evaluation.
//!
//! A [`PathPricer`] maps one realised [`Path`] to a scalar. Pricers capture
//! payoff, exercise and discounting at construction and validate them
//! there, so that evaluation itself cannot fail.
//!
//! # Key Components
//!
//! - [`EuropeanPathPricer`]: terminal payoff at a European exercise date
//! - [`DigitalPathPricer`]: American cash-or-nothing paid at first touch,
//!   with a pluggable [`CrossingCorrection`] for discrete monitoring bias
//! - [`NoControl`]: placeholder control pricer for models without a
//!   control variate

mod correction;
mod digital;
mod discount;
mod european;
mod instrument;

pub use correction::{
    bridge_maximum, bridge_minimum, BarrierSide, BrownianBridgeCorrection, CorrectionKind,
    CrossingCorrection, NoCorrection,
};
pub use digital::DigitalPathPricer;
pub use discount::{DiscountCurve, FlatForward};
pub use european::EuropeanPathPricer;
pub use instrument::{Exercise, OptionType, Payoff};

use crate::path::Path;

/// Evaluates the discounted payoff of one path.
///
/// Evaluation takes `&mut self` so that pricers may advance auxiliary
/// random sequences of their own. Closures `FnMut(&Path) -> f64` are
/// pricers too.
pub trait PathPricer: Send {
    /// Returns the discounted value of `path`.
    fn evaluate(&mut self, path: &Path) -> f64;
}

impl<F> PathPricer for F
where
    F: FnMut(&Path) -> f64 + Send,
{
    #[inline]
    fn evaluate(&mut self, path: &Path) -> f64 {
        self(path)
    }
}

/// Control pricer of a model that runs without a control variate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoControl;

impl PathPricer for NoControl {
    #[inline]
    fn evaluate(&mut self, _path: &Path) -> f64 {
        0.0
    }
}
