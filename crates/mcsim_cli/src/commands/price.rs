//! Price command implementation
//!
//! Prices an American cash-or-nothing option with the digital engine.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use mcsim_engine::convergence::{ConvergenceStatus, ExhaustionReason};
use mcsim_engine::engine::DigitalEngine;
use mcsim_engine::pricer::OptionType;
use serde::Serialize;
use tracing::info;

use super::OutputFormat;
use crate::config::{PriceOverrides, PricingConfig};
use crate::Result;

/// Outcome of one pricing run.
#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub timestamp: DateTime<Utc>,
    pub option_type: OptionType,
    pub strike: f64,
    pub cash: f64,
    pub earliest: f64,
    pub latest: f64,
    pub value: f64,
    pub error_estimate: Option<f64>,
    pub confidence_95: Option<f64>,
    pub samples: usize,
    #[serde(flatten)]
    pub status: ConvergenceStatus,
    pub elapsed_ms: f64,
}

/// Run the price command
pub fn run(config: Option<&Path>, format: OutputFormat, overrides: &PriceOverrides) -> Result<()> {
    info!("Starting pricing...");
    info!("  Config: {}", config.map_or("(defaults)".to_string(), |p| p.display().to_string()));
    info!("  Output format: {:?}", format);

    let config = PricingConfig::load(config, overrides)?;
    let report = price(&config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    info!("Pricing complete");
    Ok(())
}

/// Prices the option described by `config`.
pub fn price(config: &PricingConfig) -> Result<PriceReport> {
    let process = config.market.process()?;
    let engine_config = config.engine.engine_config()?;
    let payoff = config.option.payoff();
    let exercise = config.option.exercise()?;

    info!(
        spot = config.market.spot,
        volatility = config.market.volatility,
        steps_per_year = engine_config.max_steps_per_year(),
        antithetic = engine_config.antithetic(),
        control_variate = engine_config.control_variate(),
        "Engine configuration loaded"
    );

    let mut engine = DigitalEngine::new(process, config.market.discount_curve(), engine_config);
    if let Some(limit) = config.engine.time_limit()? {
        engine = engine.with_time_limit(limit);
    }

    let started = Instant::now();
    let result = engine.calculate(&payoff, &exercise)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1e3;

    Ok(PriceReport {
        timestamp: Utc::now(),
        option_type: config.option.option_type,
        strike: config.option.strike,
        cash: config.option.cash,
        earliest: exercise.first_date(),
        latest: exercise.last_date(),
        value: result.value,
        error_estimate: result.error_estimate,
        confidence_95: result.confidence_95(),
        samples: result.samples,
        status: result.status,
        elapsed_ms,
    })
}

fn status_label(status: ConvergenceStatus) -> &'static str {
    match status {
        ConvergenceStatus::Converged => "converged",
        ConvergenceStatus::Exhausted(ExhaustionReason::SampleCap) => "exhausted (sample cap)",
        ConvergenceStatus::Exhausted(ExhaustionReason::Cancelled) => "exhausted (cancelled)",
        ConvergenceStatus::Exhausted(ExhaustionReason::DeadlineElapsed) => {
            "exhausted (deadline)"
        }
    }
}

fn print_table(report: &PriceReport) {
    let optional = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{:.6}", v));
    let rows = [
        ("Option", format!("{} digital", report.option_type)),
        ("Strike", format!("{:.4}", report.strike)),
        ("Cash", format!("{:.4}", report.cash)),
        ("Window", format!("[{:.4}, {:.4}]", report.earliest, report.latest)),
        ("Value", format!("{:.6}", report.value)),
        ("Std error", optional(report.error_estimate)),
        ("95% CI ±", optional(report.confidence_95)),
        ("Samples", report.samples.to_string()),
        ("Status", status_label(report.status).to_string()),
        ("Elapsed", format!("{:.1} ms", report.elapsed_ms)),
    ];

    println!("\n┌────────────┬──────────────────────────┐");
    println!("│ Field      │ Value                    │");
    println!("├────────────┼──────────────────────────┤");
    for (field, value) in rows {
        println!("│ {:<10} │ {:<24} │", field, value);
    }
    println!("└────────────┴──────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;

    fn fixed(samples: usize) -> PricingConfig {
        PricingConfig {
            engine: EngineSettings {
                steps_per_year: 12,
                samples: Some(samples),
                seed: 11,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_price_fixed_count() {
        let report = price(&fixed(2_000)).unwrap();
        assert_eq!(report.samples, 2_000);
        assert_eq!(report.status, ConvergenceStatus::Converged);
        assert!(report.value > 0.0 && report.value < 1.0);
        assert!(report.confidence_95.is_some());
    }

    #[test]
    fn test_price_is_reproducible() {
        let a = price(&fixed(1_000)).unwrap();
        let b = price(&fixed(1_000)).unwrap();
        assert_eq!(a.value, b.value);
        assert_eq!(a.error_estimate, b.error_estimate);
    }

    #[test]
    fn test_sample_cap_reported() {
        let mut config = fixed(1);
        config.engine.set_tolerance(1e-6);
        config.engine.max_samples = Some(2_000);
        let report = price(&config).unwrap();
        assert_eq!(
            report.status,
            ConvergenceStatus::Exhausted(ExhaustionReason::SampleCap)
        );
        assert_eq!(status_label(report.status), "exhausted (sample cap)");
    }

    #[test]
    fn test_json_report() {
        let report = price(&fixed(500)).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(json["samples"], 500);
        assert_eq!(json["status"], "converged");
        assert_eq!(json["option_type"], "call");
    }

    #[test]
    fn test_invalid_market_rejected() {
        let mut config = fixed(10);
        config.market.spot = -1.0;
        assert!(price(&config).is_err());
    }
}
