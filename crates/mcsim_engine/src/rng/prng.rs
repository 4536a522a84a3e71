//! Pseudo-random streams backed by `StdRng`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use super::RandomStream;

/// Seed of the auxiliary uniform stream used by path corrections.
pub const DEFAULT_AUXILIARY_SEED: u64 = 76;

/// Seeded pseudo-random Gaussian stream.
///
/// # Examples
///
/// ```
/// use mcsim_engine::rng::{PseudoRandom, RandomStream};
///
/// let mut a = PseudoRandom::new(4, 42);
/// let mut b = PseudoRandom::new(4, 42);
/// let (mut xa, mut xb) = ([0.0; 4], [0.0; 4]);
/// a.next_gaussian(&mut xa);
/// b.next_gaussian(&mut xb);
/// assert_eq!(xa, xb);
/// assert!(a.allows_error_estimate());
/// ```
#[derive(Clone, Debug)]
pub struct PseudoRandom {
    inner: StdRng,
    seed: u64,
    dimension: usize,
}

impl PseudoRandom {
    /// Creates a stream of `dimension`-vectors from `seed`.
    pub fn new(dimension: usize, seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
            dimension,
        }
    }

    /// Returns the seed this stream was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomStream for PseudoRandom {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn next_gaussian(&mut self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.dimension);
        for value in out.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }

    #[inline]
    fn allows_error_estimate(&self) -> bool {
        true
    }
}

/// Independent stream of uniform vectors in `[0, 1)`.
///
/// Kept separate from the path-generation stream so that corrections
/// never consume or perturb the variates that drive the paths.
#[derive(Clone, Debug)]
pub struct UniformSequence {
    inner: StdRng,
    buffer: Vec<f64>,
}

impl UniformSequence {
    /// Creates a sequence of `dimension`-vectors from `seed`.
    pub fn new(dimension: usize, seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            buffer: vec![0.0; dimension],
        }
    }

    /// Returns the length of each vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.buffer.len()
    }

    /// Advances the sequence and returns the next vector.
    pub fn next_sequence(&mut self) -> &[f64] {
        for value in self.buffer.iter_mut() {
            *value = self.inner.gen();
        }
        &self.buffer
    }
}
