//! # mcsim_engine: Kernel Layer for Monte Carlo Pricing
//!
//! ## Role
//!
//! mcsim_engine turns the foundation types of `mcsim_core` into a working
//! simulation:
//! - Random streams, pseudo-random and low-discrepancy (`rng`)
//! - Process descriptors and path generators (`process`, `path`)
//! - Path pricers with pluggable discreteness corrections (`pricer`)
//! - The sampling loop with antithetic and control variates (`model`)
//! - Fixed-count and tolerance-driven stopping (`convergence`)
//! - Deterministic sharding over rayon (`parallel`)
//! - Validated configuration and the digital option engine (`config`,
//!   `engine`)
//!
//! ## Usage Example
//!
//! ```rust
//! use mcsim_engine::config::EngineConfig;
//! use mcsim_engine::convergence::ConvergenceStatus;
//! use mcsim_engine::engine::DigitalEngine;
//! use mcsim_engine::pricer::{Exercise, FlatForward, OptionType, Payoff};
//! use mcsim_engine::process::BlackScholesProcess;
//!
//! let process = BlackScholesProcess::new(100.0, 0.02, 0.0, 0.25).unwrap();
//! let config = EngineConfig::builder()
//!     .max_steps_per_year(52)
//!     .antithetic(true)
//!     .tolerance(0.01)
//!     .max_samples(200_000)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let engine = DigitalEngine::new(process, FlatForward::new(0.02), config);
//! let payoff = Payoff::CashOrNothing { option_type: OptionType::Put, strike: 90.0, cash: 1.0 };
//! let exercise = Exercise::American { earliest: 0.0, latest: 1.0 };
//!
//! let result = engine.calculate(&payoff, &exercise).unwrap();
//! assert_eq!(result.status, ConvergenceStatus::Converged);
//! assert!(result.error_estimate.unwrap() <= 0.01);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod convergence;
pub mod engine;
pub mod model;
pub mod parallel;
pub mod path;
pub mod pricer;
pub mod process;
pub mod rng;

pub use config::EngineConfig;
pub use convergence::{
    CancellationToken, ConvergenceController, ConvergenceCriterion, ConvergenceStatus,
    ExhaustionReason, PricingResult,
};
pub use engine::DigitalEngine;
pub use model::{ModelState, MonteCarloModel, Sampler};
pub use parallel::ShardedModel;
