//! Halton low-discrepancy sequence.

use mcsim_core::math::inverse_norm_cdf;

use super::RandomStream;

/// Low-discrepancy point sequences in the unit hypercube.
///
/// Points cover `[0, 1)^d` more evenly than pseudo-random draws, which
/// speeds up convergence of smooth integrands but leaves no probabilistic
/// error bound.
pub trait LowDiscrepancySequence {
    /// Returns the dimensionality of each point.
    fn dimension(&self) -> usize;

    /// Advances the sequence and returns the next point.
    fn next_point(&mut self) -> &[f64];

    /// Restarts the sequence at its start index.
    fn reset(&mut self);

    /// Skips `n` points.
    ///
    /// Used to hand disjoint slices of one sequence to parallel shards.
    fn skip(&mut self, n: u64);
}

/// Halton sequence with the first `d` primes as bases.
///
/// Index 0 (the origin) is never produced. As a [`RandomStream`] every
/// coordinate is mapped through the inverse normal CDF.
///
/// # Examples
///
/// ```
/// use mcsim_engine::rng::{HaltonSequence, LowDiscrepancySequence};
///
/// let mut seq = HaltonSequence::new(2);
/// assert_eq!(seq.next_point(), &[0.5, 1.0 / 3.0]);
/// assert_eq!(seq.next_point(), &[0.25, 2.0 / 3.0]);
/// ```
#[derive(Clone, Debug)]
pub struct HaltonSequence {
    bases: Vec<u64>,
    start: u64,
    index: u64,
    point: Vec<f64>,
}

impl HaltonSequence {
    /// Creates a sequence of `dimension`-points starting after the origin.
    pub fn new(dimension: usize) -> Self {
        Self::with_start_index(dimension, 0)
    }

    /// Creates a sequence whose first point is the one after `start`.
    pub fn with_start_index(dimension: usize, start: u64) -> Self {
        Self {
            bases: first_primes(dimension),
            start,
            index: start,
            point: vec![0.0; dimension],
        }
    }

    /// Returns the index of the last point produced.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    fn advance(&mut self) {
        self.index += 1;
        for (value, &base) in self.point.iter_mut().zip(&self.bases) {
            *value = radical_inverse(self.index, base);
        }
    }
}

impl LowDiscrepancySequence for HaltonSequence {
    #[inline]
    fn dimension(&self) -> usize {
        self.point.len()
    }

    fn next_point(&mut self) -> &[f64] {
        self.advance();
        &self.point
    }

    fn reset(&mut self) {
        self.index = self.start;
    }

    fn skip(&mut self, n: u64) {
        self.index += n;
    }
}

impl RandomStream for HaltonSequence {
    #[inline]
    fn dimension(&self) -> usize {
        self.point.len()
    }

    fn next_gaussian(&mut self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.point.len());
        self.advance();
        for (z, &u) in out.iter_mut().zip(&self.point) {
            *z = inverse_norm_cdf(u);
        }
    }

    #[inline]
    fn allows_error_estimate(&self) -> bool {
        false
    }
}

/// Van der Corput radical inverse of `index` in `base`.
fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut f = inv_base;
    let mut result = 0.0;
    while index > 0 {
        result += f * (index % base) as f64;
        index /= base;
        f *= inv_base;
    }
    result
}

fn first_primes(n: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
