//! Running sample statistics for Monte Carlo estimation.
//!
//! # Key Components
//!
//! - [`SampleStatistics`]: weighted running mean and variance with a
//!   standard-error estimate, mergeable across independent shards
//! - [`PairedStatistics`]: bivariate accumulator for target/control pairs,
//!   producing the control-variate corrected mean and error
//!
//! # Design
//!
//! Both accumulators use incremental (Welford-style) updates for numerical
//! stability and the pairwise combination formula for merging, so that the
//! merged mean and error do not depend on the order shards are folded in
//! beyond floating-point rounding.

mod paired;
mod sample;

pub use paired::PairedStatistics;
pub use sample::SampleStatistics;
