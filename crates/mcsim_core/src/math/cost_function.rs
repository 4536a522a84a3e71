//! Objective-function interface for calibration and optimisation.

/// Scalar cost function of a parameter vector.
///
/// Only [`CostFunction::value`] is required. The gradient defaults to a
/// central finite difference with step [`CostFunction::finite_difference_epsilon`];
/// implementations with an analytic gradient override it.
///
/// # Examples
///
/// ```
/// use mcsim_core::math::CostFunction;
///
/// struct Quadratic;
///
/// impl CostFunction for Quadratic {
///     fn value(&self, x: &[f64]) -> f64 {
///         x.iter().map(|v| v * v).sum()
///     }
/// }
///
/// let mut grad = [0.0; 2];
/// let f = Quadratic.value_and_gradient(&[1.0, -2.0], &mut grad);
/// assert!((f - 5.0).abs() < 1e-12);
/// assert!((grad[0] - 2.0).abs() < 1e-6);
/// assert!((grad[1] + 4.0).abs() < 1e-6);
/// ```
pub trait CostFunction {
    /// Evaluates the cost at `x`.
    fn value(&self, x: &[f64]) -> f64;

    /// Writes the gradient at `x` into `grad`.
    ///
    /// `grad` must have the same length as `x`.
    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        debug_assert_eq!(x.len(), grad.len());
        let eps = self.finite_difference_epsilon();
        let mut xx = x.to_vec();
        for (i, g) in grad.iter_mut().enumerate() {
            xx[i] = x[i] + eps;
            let fp = self.value(&xx);
            xx[i] = x[i] - eps;
            let fm = self.value(&xx);
            xx[i] = x[i];
            *g = 0.5 * (fp - fm) / eps;
        }
    }

    /// Writes the gradient into `grad` and returns the value, both at `x`.
    fn value_and_gradient(&self, x: &[f64], grad: &mut [f64]) -> f64 {
        self.gradient(x, grad);
        self.value(x)
    }

    /// Step used by the default finite-difference gradient.
    fn finite_difference_epsilon(&self) -> f64 {
        1e-8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    struct Rosenbrock;

    impl CostFunction for Rosenbrock {
        fn value(&self, x: &[f64]) -> f64 {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        }
    }

    struct Analytic {
        gradient_calls: Cell<usize>,
    }

    impl CostFunction for Analytic {
        fn value(&self, x: &[f64]) -> f64 {
            3.0 * x[0]
        }

        fn gradient(&self, _x: &[f64], grad: &mut [f64]) {
            self.gradient_calls.set(self.gradient_calls.get() + 1);
            grad[0] = 3.0;
        }
    }

    struct CoarseStep;

    impl CostFunction for CoarseStep {
        fn value(&self, x: &[f64]) -> f64 {
            x[0].powi(3)
        }

        fn finite_difference_epsilon(&self) -> f64 {
            0.1
        }
    }

    #[test]
    fn test_default_gradient_matches_analytic() {
        let x = [-1.2, 1.0];
        let mut grad = [0.0; 2];
        Rosenbrock.gradient(&x, &mut grad);

        let dx = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]);
        let dy = 200.0 * (x[1] - x[0] * x[0]);
        assert_abs_diff_eq!(grad[0], dx, epsilon = 1e-4);
        assert_abs_diff_eq!(grad[1], dy, epsilon = 1e-4);
    }

    #[test]
    fn test_overridden_gradient_used_by_value_and_gradient() {
        let f = Analytic {
            gradient_calls: Cell::new(0),
        };
        let mut grad = [0.0];
        let v = f.value_and_gradient(&[2.0], &mut grad);
        assert_eq!(v, 6.0);
        assert_eq!(grad[0], 3.0);
        assert_eq!(f.gradient_calls.get(), 1);
    }

    #[test]
    fn test_custom_epsilon() {
        // Central difference of x^3 at 1 with h = 0.1 is 3 + h^2.
        let mut grad = [0.0];
        CoarseStep.gradient(&[1.0], &mut grad);
        assert_abs_diff_eq!(grad[0], 3.01, epsilon = 1e-10);
    }
}
