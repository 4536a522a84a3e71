//! End-to-end pricing of American cash-or-nothing options.
//!
//! With zero rates the value of a one-touch call paying 1 on reaching
//! `H > S` before `T` is the first-passage probability
//!
//! ```text
//! P = N((-h - s^2 T / 2) / (s sqrt T)) + (S / H) N((-h + s^2 T / 2) / (s sqrt T)),  h = ln(H / S)
//! ```

use mcsim_core::math::norm_cdf;
use mcsim_engine::config::EngineConfig;
use mcsim_engine::convergence::{CancellationToken, ConvergenceStatus, ExhaustionReason};
use mcsim_engine::engine::DigitalEngine;
use mcsim_engine::pricer::{CorrectionKind, Exercise, FlatForward, OptionType, Payoff};
use mcsim_engine::process::BlackScholesProcess;
use mcsim_engine::rng::RandomStreamKind;

const SPOT: f64 = 100.0;
const BARRIER: f64 = 110.0;
const VOL: f64 = 0.2;
const MATURITY: f64 = 1.0;

fn first_passage_probability() -> f64 {
    let h = (BARRIER / SPOT).ln();
    let s = VOL * MATURITY.sqrt();
    let m = 0.5 * VOL * VOL * MATURITY;
    norm_cdf((-h - m) / s) + SPOT / BARRIER * norm_cdf((-h + m) / s)
}

fn european_digital_value() -> f64 {
    let d2 = ((SPOT / BARRIER).ln() - 0.5 * VOL * VOL * MATURITY) / (VOL * MATURITY.sqrt());
    norm_cdf(d2)
}

fn one_touch() -> Payoff {
    Payoff::CashOrNothing {
        option_type: OptionType::Call,
        strike: BARRIER,
        cash: 1.0,
    }
}

fn window() -> Exercise {
    Exercise::American {
        earliest: 0.0,
        latest: MATURITY,
    }
}

fn engine(config: EngineConfig) -> DigitalEngine<BlackScholesProcess, FlatForward> {
    let process = BlackScholesProcess::new(SPOT, 0.0, 0.0, VOL).unwrap();
    DigitalEngine::new(process, FlatForward::new(0.0), config)
}

#[test]
fn test_reference_value() {
    assert!((first_passage_probability() - 0.60326).abs() < 1e-4);
}

#[test]
fn test_bridge_corrected_price_matches_first_passage() {
    let config = EngineConfig::builder()
        .max_steps_per_year(52)
        .required_samples(20_000)
        .seed(12345)
        .build()
        .unwrap();
    let result = engine(config).calculate(&one_touch(), &window()).unwrap();

    let error = result.error_estimate.unwrap();
    assert_eq!(result.samples, 20_000);
    assert_eq!(result.status, ConvergenceStatus::Converged);
    assert!(
        (result.value - first_passage_probability()).abs() < 4.0 * error,
        "value {} error {}",
        result.value,
        error
    );
}

#[test]
fn test_discrete_monitoring_underprices() {
    let build = |correction| {
        EngineConfig::builder()
            .max_steps_per_year(52)
            .required_samples(20_000)
            .seed(99)
            .correction(correction)
            .build()
            .unwrap()
    };
    let corrected = engine(build(CorrectionKind::BrownianBridge))
        .calculate(&one_touch(), &window())
        .unwrap();
    let discrete = engine(build(CorrectionKind::None))
        .calculate(&one_touch(), &window())
        .unwrap();
    assert!(discrete.value < corrected.value - 0.03);
}

#[test]
fn test_antithetic_and_control_variate() {
    let plain = EngineConfig::builder()
        .max_steps_per_year(52)
        .required_samples(10_000)
        .seed(5)
        .build()
        .unwrap();
    let reduced = EngineConfig::builder()
        .max_steps_per_year(52)
        .required_samples(10_000)
        .seed(5)
        .antithetic(true)
        .control_variate(true)
        .control_reference(european_digital_value())
        .build()
        .unwrap();

    let plain = engine(plain).calculate(&one_touch(), &window()).unwrap();
    let reduced = engine(reduced).calculate(&one_touch(), &window()).unwrap();

    assert_eq!(reduced.samples, 10_000);
    let error = reduced.error_estimate.unwrap();
    assert!(error < plain.error_estimate.unwrap());
    assert!((reduced.value - first_passage_probability()).abs() < 4.0 * error);
}

#[test]
fn test_tolerance_driven_run_converges() {
    let config = EngineConfig::builder()
        .max_steps_per_year(12)
        .tolerance(0.005)
        .max_samples(1_000_000)
        .seed(8)
        .build()
        .unwrap();
    let result = engine(config).calculate(&one_touch(), &window()).unwrap();
    assert_eq!(result.status, ConvergenceStatus::Converged);
    assert!(result.error_estimate.unwrap() <= 0.005);
    assert!(result.samples <= 1_000_000);
}

#[test]
fn test_unreachable_tolerance_exhausts_at_cap() {
    let config = EngineConfig::builder()
        .max_steps_per_year(4)
        .tolerance(1e-6)
        .max_samples(3_000)
        .build()
        .unwrap();
    let result = engine(config).calculate(&one_touch(), &window()).unwrap();
    assert_eq!(
        result.status,
        ConvergenceStatus::Exhausted(ExhaustionReason::SampleCap)
    );
    assert_eq!(result.samples, 3_000);
    assert!(result.error_estimate.is_some());
}

#[test]
fn test_cancelled_engine_returns_best_estimate() {
    let token = CancellationToken::new();
    token.cancel();
    let config = EngineConfig::builder()
        .max_steps_per_year(4)
        .tolerance(1e-6)
        .build()
        .unwrap();
    let result = engine(config)
        .with_cancellation(token)
        .calculate(&one_touch(), &window())
        .unwrap();
    assert_eq!(
        result.status,
        ConvergenceStatus::Exhausted(ExhaustionReason::Cancelled)
    );
    assert_eq!(result.samples, 0);
}

#[test]
fn test_sharded_pricing_is_reproducible() {
    let config = || {
        EngineConfig::builder()
            .max_steps_per_year(12)
            .required_samples(8_000)
            .shards(4)
            .seed(77)
            .build()
            .unwrap()
    };
    let a = engine(config()).calculate(&one_touch(), &window()).unwrap();
    let b = engine(config()).calculate(&one_touch(), &window()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.samples, 8_000);
    assert!((a.value - first_passage_probability()).abs() < 4.0 * a.error_estimate.unwrap());
}

#[test]
fn test_low_discrepancy_fixed_count() {
    let config = EngineConfig::builder()
        .max_steps_per_year(4)
        .required_samples(8_192)
        .random_stream(RandomStreamKind::LowDiscrepancy)
        .build()
        .unwrap();
    let result = engine(config).calculate(&one_touch(), &window()).unwrap();
    assert_eq!(result.error_estimate, None);
    assert!((result.value - first_passage_probability()).abs() < 0.02);
}

#[test]
fn test_put_side_and_late_window() {
    // a later window can only lower the touch probability
    let config = || {
        EngineConfig::builder()
            .max_steps_per_year(12)
            .required_samples(10_000)
            .seed(3)
            .build()
            .unwrap()
    };
    let put = Payoff::CashOrNothing {
        option_type: OptionType::Put,
        strike: 90.0,
        cash: 1.0,
    };
    let full = engine(config()).calculate(&put, &window()).unwrap();
    let late = engine(config())
        .calculate(
            &put,
            &Exercise::American {
                earliest: 0.5,
                latest: MATURITY,
            },
        )
        .unwrap();
    assert!(full.value > 0.0);
    assert!(late.value < full.value);
}
