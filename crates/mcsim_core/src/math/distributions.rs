//! Standard normal distribution functions.
//!
//! - `norm_cdf`: cumulative distribution function
//! - `norm_pdf`: density
//! - `inverse_norm_cdf`: quantile function, used to map low-discrepancy
//!   uniforms onto Gaussian increments

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function, Abramowitz and Stegun 7.1.26.
///
/// Maximum absolute error 1.5e-7.
#[inline]
fn erfc_approx(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + P * abs_x);
    let poly = A1 + t * (A2 + t * (A3 + t * (A4 + t * A5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    if x < 0.0 {
        2.0 - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal cumulative distribution function.
///
/// # Examples
/// ```
/// use mcsim_core::math::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0) < 0.01);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc_approx(-x / std::f64::consts::SQRT_2)
}

/// Standard normal probability density function.
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Inverse of the standard normal CDF (Beasley-Springer-Moro).
///
/// Rational approximation in the central region `|u - 0.5| <= 0.42` and a
/// Chebyshev expansion in `ln(-ln(r))` in the tails. Arguments are clamped
/// to `[1e-300, 1 - 1e-16]` so the result is always finite.
///
/// # Examples
/// ```
/// use mcsim_core::math::inverse_norm_cdf;
///
/// assert!(inverse_norm_cdf(0.5).abs() < 1e-12);
/// assert!((inverse_norm_cdf(0.975) - 1.959964).abs() < 1e-5);
/// ```
pub fn inverse_norm_cdf(u: f64) -> f64 {
    const A: [f64; 4] = [
        2.506_628_238_84,
        -18.615_000_625_29,
        41.391_197_735_34,
        -25.441_060_496_37,
    ];
    const B: [f64; 4] = [
        -8.473_510_930_90,
        23.083_367_437_43,
        -21.062_241_018_26,
        3.130_829_098_33,
    ];
    const C: [f64; 9] = [
        0.337_475_482_272_614_7,
        0.976_169_019_091_718_6,
        0.160_797_971_491_820_9,
        0.027_643_881_033_386_3,
        0.003_840_572_937_360_9,
        0.000_395_189_651_191_9,
        0.000_032_176_788_176_8,
        0.000_000_288_816_736_4,
        0.000_000_396_031_518_7,
    ];

    let u = u.clamp(1e-300, 1.0 - 1e-16);
    let y = u - 0.5;

    if y.abs() <= 0.42 {
        let r = y * y;
        let numer = A[0] + r * (A[1] + r * (A[2] + r * A[3]));
        let denom = 1.0 + r * (B[0] + r * (B[1] + r * (B[2] + r * B[3])));
        return y * numer / denom;
    }

    let r = if y < 0.0 { u } else { 1.0 - u };
    let s = (-r.ln()).ln();
    let z = C
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * s + c);

    if y < 0.0 {
        -z
    } else {
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_norm_cdf_known_values() {
        assert_abs_diff_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(norm_cdf(1.0), 0.841_344_746, epsilon = 1e-6);
        assert_abs_diff_eq!(norm_cdf(-1.959_964), 0.025, epsilon = 1e-6);
    }

    #[test]
    fn test_norm_pdf_at_zero() {
        assert_abs_diff_eq!(norm_pdf(0.0), FRAC_1_SQRT_2PI, epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_central_and_tail() {
        assert_abs_diff_eq!(inverse_norm_cdf(0.5), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inverse_norm_cdf(0.841_344_746), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_norm_cdf(0.001), -3.090_232_306, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_norm_cdf(0.999), 3.090_232_306, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_is_finite_at_boundaries() {
        assert!(inverse_norm_cdf(0.0).is_finite());
        assert!(inverse_norm_cdf(1.0).is_finite());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_inverse_round_trips_through_cdf(u in 0.001f64..0.999) {
            let z = inverse_norm_cdf(u);
            prop_assert!((norm_cdf(z) - u).abs() < 1e-6);
        }

        #[test]
        fn test_inverse_is_antisymmetric(u in 0.0001f64..0.5) {
            prop_assert!((inverse_norm_cdf(u) + inverse_norm_cdf(1.0 - u)).abs() < 1e-8);
        }
    }
}
