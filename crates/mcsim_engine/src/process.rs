//! Process descriptors consumed by path generators.
//!
//! A [`Process`] supplies the drift and diffusion of a one-dimensional
//! diffusion `dX = mu(t, X) dt + sigma(t, X) dW` together with a one-step
//! evolution rule. The default rule is an Euler step; processes with a known
//! transition (such as [`BlackScholesProcess`]) override it with the exact
//! one.

use mcsim_core::market_data::VolatilitySurface;
use mcsim_core::{SimulationError, Time};
use serde::{Deserialize, Serialize};

/// One-dimensional diffusion process.
pub trait Process: Send + Sync {
    /// Returns the state at time 0.
    fn initial_value(&self) -> f64;

    /// Returns the drift `mu(t, x)`.
    fn drift(&self, t: Time, x: f64) -> f64;

    /// Returns the diffusion `sigma(t, x)`.
    fn diffusion(&self, t: Time, x: f64) -> f64;

    /// Evolves `x` from `t` over `dt` given a standard normal variate `dw`.
    fn evolve(&self, t: Time, x: f64, dt: Time, dw: f64) -> f64 {
        x + self.drift(t, x) * dt + self.diffusion(t, x) * dt.sqrt() * dw
    }

    /// Returns the volatility of `ln X` at `(t, x)`.
    ///
    /// Used by discreteness corrections that bridge the log-state between
    /// grid nodes.
    fn log_volatility(&self, t: Time, x: f64) -> f64 {
        self.diffusion(t, x) / x
    }
}

/// Geometric Brownian motion with continuous dividend yield.
///
/// `dS = (r - q) S dt + sigma S dW`, evolved exactly in log space.
///
/// # Examples
///
/// ```
/// use mcsim_engine::process::{BlackScholesProcess, Process};
///
/// let process = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let s = process.evolve(0.0, 100.0, 1.0, 0.0);
/// assert!((s - 100.0 * (0.05f64 - 0.02).exp()).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlackScholesProcess {
    spot: f64,
    risk_free_rate: f64,
    dividend_yield: f64,
    volatility: f64,
}

impl BlackScholesProcess {
    /// Creates a process from spot, rates and volatility.
    ///
    /// # Errors
    ///
    /// `InputValidation` if the spot is not positive and finite, a rate is
    /// not finite, or the volatility is negative or not finite.
    pub fn new(
        spot: f64,
        risk_free_rate: f64,
        dividend_yield: f64,
        volatility: f64,
    ) -> Result<Self, SimulationError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(SimulationError::input(format!(
                "spot must be positive and finite, got {}",
                spot
            )));
        }
        if !risk_free_rate.is_finite() || !dividend_yield.is_finite() {
            return Err(SimulationError::input("rates must be finite"));
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(SimulationError::input(format!(
                "volatility must be non-negative and finite, got {}",
                volatility
            )));
        }
        Ok(Self {
            spot,
            risk_free_rate,
            dividend_yield,
            volatility,
        })
    }

    /// Creates a process whose volatility is read from `surface` at
    /// option time `t` and `strike`.
    pub fn from_surface(
        spot: f64,
        risk_free_rate: f64,
        dividend_yield: f64,
        surface: &dyn VolatilitySurface,
        t: Time,
        strike: f64,
    ) -> Result<Self, SimulationError> {
        let volatility = surface.volatility(t, strike)?;
        Self::new(spot, risk_free_rate, dividend_yield, volatility)
    }

    /// Returns the spot.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Returns the continuously compounded risk-free rate.
    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Returns the continuous dividend yield.
    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

impl Process for BlackScholesProcess {
    #[inline]
    fn initial_value(&self) -> f64 {
        self.spot
    }

    #[inline]
    fn drift(&self, _t: Time, x: f64) -> f64 {
        (self.risk_free_rate - self.dividend_yield) * x
    }

    #[inline]
    fn diffusion(&self, _t: Time, x: f64) -> f64 {
        self.volatility * x
    }

    #[inline]
    fn evolve(&self, _t: Time, x: f64, dt: Time, dw: f64) -> f64 {
        let sigma = self.volatility;
        let mu = self.risk_free_rate - self.dividend_yield - 0.5 * sigma * sigma;
        x * (mu * dt + sigma * dt.sqrt() * dw).exp()
    }

    #[inline]
    fn log_volatility(&self, _t: Time, _x: f64) -> f64 {
        self.volatility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mcsim_core::market_data::{FlatVolatility, QuotedVolSurface};

    struct Ornstein {
        theta: f64,
        kappa: f64,
        sigma: f64,
    }

    impl Process for Ornstein {
        fn initial_value(&self) -> f64 {
            0.0
        }
        fn drift(&self, _t: Time, x: f64) -> f64 {
            self.kappa * (self.theta - x)
        }
        fn diffusion(&self, _t: Time, _x: f64) -> f64 {
            self.sigma
        }
    }

    #[test]
    fn test_default_euler_step() {
        let p = Ornstein {
            theta: 1.0,
            kappa: 2.0,
            sigma: 0.5,
        };
        let x = p.evolve(0.0, 0.0, 0.25, 1.0);
        assert_relative_eq!(x, 2.0 * 0.25 + 0.5 * 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_black_scholes_exact_step() {
        let p = BlackScholesProcess::new(100.0, 0.03, 0.01, 0.25).unwrap();
        let dt: f64 = 0.5;
        let dw = -0.7;
        let expected = 100.0 * ((0.02 - 0.5 * 0.0625) * dt + 0.25 * dt.sqrt() * dw).exp();
        assert_relative_eq!(p.evolve(0.0, 100.0, dt, dw), expected, epsilon = 1e-12);
        assert_eq!(p.log_volatility(0.0, 55.0), 0.25);
        assert_relative_eq!(p.drift(0.0, 50.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_log_volatility() {
        let p = Ornstein {
            theta: 0.0,
            kappa: 1.0,
            sigma: 0.3,
        };
        assert_relative_eq!(p.log_volatility(0.0, 2.0), 0.15);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            BlackScholesProcess::new(0.0, 0.0, 0.0, 0.2),
            Err(SimulationError::InputValidation(_))
        ));
        assert!(BlackScholesProcess::new(100.0, f64::NAN, 0.0, 0.2).is_err());
        assert!(BlackScholesProcess::new(100.0, 0.0, 0.0, -0.1).is_err());
    }

    #[test]
    fn test_from_surface() {
        let flat = FlatVolatility::new(0.3);
        let p = BlackScholesProcess::from_surface(100.0, 0.0, 0.0, &flat, 1.0, 100.0).unwrap();
        assert_eq!(p.volatility(), 0.3);

        let surface = QuotedVolSurface::from_values(
            vec![0.5, 1.0],
            vec![90.0, 110.0],
            vec![vec![0.2, 0.2], vec![0.3, 0.3]],
        )
        .unwrap();
        let p = BlackScholesProcess::from_surface(100.0, 0.0, 0.0, &surface, 0.75, 100.0).unwrap();
        assert_relative_eq!(p.volatility(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_from_surface_propagates_market_data_error() {
        let flat = FlatVolatility::new(0.3);
        let result = BlackScholesProcess::from_surface(100.0, 0.0, 0.0, &flat, -1.0, 100.0);
        assert!(matches!(result, Err(SimulationError::MarketData(_))));
    }
}
