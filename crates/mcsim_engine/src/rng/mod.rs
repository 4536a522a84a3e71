//! Random number streams driving path generation.
//!
//! This module provides:
//! - [`RandomStream`]: Gaussian vectors of fixed dimension, one per path
//! - [`PseudoRandom`]: seeded `StdRng` stream supporting an error estimate
//! - [`HaltonSequence`]: low-discrepancy stream without an error estimate
//! - [`UniformSequence`]: auxiliary uniform vectors for path corrections
//! - [`shard_seed`]: deterministic per-shard seed derivation
//!
//! # Reproducibility
//!
//! Every stream is fully determined by its seed (or start index), so runs
//! are reproducible and independent shards can be derived from one base
//! seed without sharing generator state.

mod halton;
mod prng;

pub use halton::{HaltonSequence, LowDiscrepancySequence};
pub use prng::{PseudoRandom, UniformSequence, DEFAULT_AUXILIARY_SEED};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of standard normal vectors, one vector per simulated path.
pub trait RandomStream: Send {
    /// Returns the length of each vector.
    fn dimension(&self) -> usize;

    /// Fills `out` with the next vector of standard normal variates.
    ///
    /// `out.len()` must equal [`RandomStream::dimension`].
    fn next_gaussian(&mut self, out: &mut [f64]);

    /// Returns whether a statistical error estimate is meaningful.
    ///
    /// `false` for deterministic low-discrepancy streams.
    fn allows_error_estimate(&self) -> bool;
}

/// Selects the random stream family used by an engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomStreamKind {
    /// Seeded pseudo-random numbers.
    #[default]
    PseudoRandom,
    /// Halton low-discrepancy points.
    LowDiscrepancy,
}

impl RandomStreamKind {
    /// Returns whether streams of this kind support an error estimate.
    pub fn allows_error_estimate(&self) -> bool {
        matches!(self, RandomStreamKind::PseudoRandom)
    }
}

impl FromStr for RandomStreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "pseudo_random" | "pseudorandom" | "prng" => Ok(RandomStreamKind::PseudoRandom),
            "low_discrepancy" | "halton" | "qmc" => Ok(RandomStreamKind::LowDiscrepancy),
            _ => Err(format!("Unknown random stream: {}", s)),
        }
    }
}

impl fmt::Display for RandomStreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandomStreamKind::PseudoRandom => write!(f, "pseudo_random"),
            RandomStreamKind::LowDiscrepancy => write!(f, "low_discrepancy"),
        }
    }
}

/// Derives the seed of shard `shard` from a base seed.
///
/// Shard 0 keeps the base seed, so a single-shard run reproduces the
/// sequential stream. Other shards get a splitmix64 hash of the base seed
/// and shard index.
///
/// # Examples
///
/// ```
/// use mcsim_engine::rng::shard_seed;
///
/// assert_eq!(shard_seed(42, 0), 42);
/// assert_ne!(shard_seed(42, 1), shard_seed(42, 2));
/// assert_eq!(shard_seed(42, 3), shard_seed(42, 3));
/// ```
pub fn shard_seed(base: u64, shard: usize) -> u64 {
    if shard == 0 {
        return base;
    }
    splitmix64(base ^ ((shard as u64) << 32) ^ shard as u64)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shard_seeds_distinct() {
        let seeds: HashSet<u64> = (0..1000).map(|s| shard_seed(7, s)).collect();
        assert_eq!(seeds.len(), 1000);
    }

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!(
            "halton".parse::<RandomStreamKind>().unwrap(),
            RandomStreamKind::LowDiscrepancy
        );
        assert_eq!(
            "pseudo-random".parse::<RandomStreamKind>().unwrap(),
            RandomStreamKind::PseudoRandom
        );
        assert!("sobol".parse::<RandomStreamKind>().is_err());
        assert_eq!(RandomStreamKind::LowDiscrepancy.to_string(), "low_discrepancy");
    }

    #[test]
    fn test_kind_error_estimate_flag() {
        assert!(RandomStreamKind::PseudoRandom.allows_error_estimate());
        assert!(!RandomStreamKind::LowDiscrepancy.allows_error_estimate());
    }
}
