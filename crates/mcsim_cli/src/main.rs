//! mcsim - Command Line Monte Carlo Pricing
//!
//! Operational entry point for the mcsim simulation engine.
//!
//! # Commands
//!
//! - `mcsim price --config <file>` - Price an American cash-or-nothing option
//! - `mcsim grid --times 1,2,3 --steps 6` - Print a constructed time grid
//!
//! # Architecture
//!
//! As part of the **Service** layer, this crate wires the configuration
//! sources to `mcsim_engine` and renders the results.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mcsim_core::types::DayCountConvention;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::grid::GridInput;
use commands::OutputFormat;
use config::{LogLevel, PriceOverrides};

/// Monte Carlo option pricing CLI
#[derive(Parser)]
#[command(name = "mcsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, env = "MCSIM_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an American cash-or-nothing option
    Price {
        /// Configuration file path (TOML format)
        #[arg(short, long, env = "MCSIM_CONFIG", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        #[command(flatten)]
        overrides: PriceOverrides,
    },

    /// Print the time grid for a set of mandatory times or dates
    Grid {
        /// Mandatory times in years, comma separated
        #[arg(short, long, value_delimiter = ',', required_unless_present = "dates")]
        times: Vec<f64>,

        /// Event dates (YYYY-MM-DD), comma separated
        #[arg(short, long, value_delimiter = ',', conflicts_with = "times", requires = "reference")]
        dates: Vec<NaiveDate>,

        /// Reference date for `--dates`
        #[arg(short, long)]
        reference: Option<NaiveDate>,

        /// Day count convention for `--dates`
        #[arg(long, default_value = "ACT/365F")]
        day_count: DayCountConvention,

        /// Target number of steps over the horizon
        #[arg(short, long)]
        steps: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    init_tracing(level.as_filter_str());

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Price {
            config,
            format,
            overrides,
        } => commands::price::run(config.as_deref(), format, &overrides)
            .context("price command failed"),
        Commands::Grid {
            times,
            dates,
            reference,
            day_count,
            steps,
            format,
        } => {
            let input = match reference {
                Some(reference) if !dates.is_empty() => GridInput::Dates {
                    reference,
                    dates,
                    day_count,
                },
                _ => GridInput::Times(times),
            };
            commands::grid::run(&input, steps, format).context("grid command failed")
        }
    }
}
