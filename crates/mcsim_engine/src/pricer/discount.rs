//! Discount curves.

use mcsim_core::Time;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Discount factor lookup.
pub trait DiscountCurve: Send + Sync {
    /// Returns the discount factor from `t` back to time 0.
    fn discount(&self, t: Time) -> f64;
}

impl<D: DiscountCurve + ?Sized> DiscountCurve for Arc<D> {
    #[inline]
    fn discount(&self, t: Time) -> f64 {
        (**self).discount(t)
    }
}

impl<D: DiscountCurve + ?Sized> DiscountCurve for &D {
    #[inline]
    fn discount(&self, t: Time) -> f64 {
        (**self).discount(t)
    }
}

/// Flat continuously compounded curve, `D(t) = exp(-r t)`.
///
/// # Examples
///
/// ```
/// use mcsim_engine::pricer::{DiscountCurve, FlatForward};
///
/// let curve = FlatForward::new(0.05);
/// assert!((curve.discount(2.0) - (-0.1f64).exp()).abs() < 1e-15);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatForward {
    rate: f64,
}

impl FlatForward {
    /// Creates a flat curve at `rate`.
    #[inline]
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Returns the rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl DiscountCurve for FlatForward {
    #[inline]
    fn discount(&self, t: Time) -> f64 {
        (-self.rate * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_forward_origin_and_shared() {
        let curve: Arc<dyn DiscountCurve> = Arc::new(FlatForward::new(0.03));
        assert_eq!(curve.discount(0.0), 1.0);
        assert!(curve.discount(1.0) < 1.0);
        assert_eq!((&FlatForward::new(0.0)).discount(5.0), 1.0);
    }
}
