//! Univariate running statistics.

use serde::Serialize;

/// Weighted running statistics of a stream of samples.
///
/// Tracks the sample count, total weight, running mean and the running sum
/// of weighted squared deviations, from which the unbiased variance and the
/// standard error of the mean are derived.
///
/// # Error Estimate
///
/// The error estimate is only meaningful for genuinely random sampling. An
/// accumulator fed from a low-discrepancy stream is created with
/// [`SampleStatistics::without_error_estimate`] and reports `None`.
///
/// # Examples
///
/// ```rust
/// use mcsim_core::statistics::SampleStatistics;
///
/// let mut stats = SampleStatistics::new();
/// stats.add(1.0);
/// stats.add(3.0);
///
/// assert_eq!(stats.samples(), 2);
/// assert_eq!(stats.mean(), 2.0);
/// assert_eq!(stats.variance(), 2.0);
/// assert_eq!(stats.error_estimate(), Some(1.0));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleStatistics {
    samples: usize,
    weight_sum: f64,
    mean: f64,
    /// Sum of weighted squared deviations from the running mean.
    m2: f64,
    min: f64,
    max: f64,
    error_estimate_allowed: bool,
}

impl Default for SampleStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStatistics {
    /// Creates an empty accumulator reporting an error estimate.
    pub fn new() -> Self {
        Self {
            samples: 0,
            weight_sum: 0.0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            error_estimate_allowed: true,
        }
    }

    /// Creates an empty accumulator that never reports an error estimate.
    pub fn without_error_estimate() -> Self {
        Self {
            error_estimate_allowed: false,
            ..Self::new()
        }
    }

    /// Sets whether an error estimate is reported.
    pub fn with_error_estimate(mut self, allowed: bool) -> Self {
        self.error_estimate_allowed = allowed;
        self
    }

    /// Adds a sample with unit weight.
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.add_weighted(value, 1.0);
    }

    /// Adds a sample with the given non-negative weight.
    ///
    /// Zero-weight samples are counted but do not move the moments.
    pub fn add_weighted(&mut self, value: f64, weight: f64) {
        debug_assert!(weight >= 0.0, "negative weight {}", weight);
        self.samples += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if weight == 0.0 {
            return;
        }

        let new_weight = self.weight_sum + weight;
        let delta = value - self.mean;
        self.mean += delta * weight / new_weight;
        self.m2 += weight * delta * (value - self.mean);
        self.weight_sum = new_weight;
    }

    /// Adds every value of the iterator with unit weight.
    pub fn extend<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for v in values {
            self.add(v);
        }
    }

    /// Folds another accumulator into this one.
    ///
    /// Uses the parallel-variance combination, so merging shards in any
    /// order yields the same moments up to rounding.
    pub fn merge(&mut self, other: &SampleStatistics) {
        if other.samples == 0 {
            return;
        }
        if self.samples == 0 {
            let allowed = self.error_estimate_allowed && other.error_estimate_allowed;
            *self = other.clone();
            self.error_estimate_allowed = allowed;
            return;
        }

        let total = self.weight_sum + other.weight_sum;
        if total > 0.0 {
            let delta = other.mean - self.mean;
            self.mean += delta * other.weight_sum / total;
            self.m2 += other.m2 + delta * delta * self.weight_sum * other.weight_sum / total;
        }
        self.weight_sum = total;
        self.samples += other.samples;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.error_estimate_allowed &= other.error_estimate_allowed;
    }

    /// Returns the number of samples added.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the sum of sample weights.
    #[inline]
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// Returns the weighted mean, or 0 for an empty accumulator.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the unbiased variance, or 0 with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.samples < 2 || self.weight_sum <= 0.0 {
            return 0.0;
        }
        let n = self.samples as f64;
        (self.m2 / self.weight_sum * n / (n - 1.0)).max(0.0)
    }

    /// Returns the standard deviation.
    #[inline]
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Returns the standard error of the mean.
    ///
    /// `None` when the stream does not support a statistical error or fewer
    /// than two samples have been added.
    pub fn error_estimate(&self) -> Option<f64> {
        if !self.error_estimate_allowed || self.samples < 2 {
            return None;
        }
        Some((self.variance() / self.samples as f64).sqrt())
    }

    /// Returns whether an error estimate is reported at all.
    #[inline]
    pub fn allows_error_estimate(&self) -> bool {
        self.error_estimate_allowed
    }

    /// Returns the smallest sample, or `None` when empty.
    pub fn min(&self) -> Option<f64> {
        (self.samples > 0).then_some(self.min)
    }

    /// Returns the largest sample, or `None` when empty.
    pub fn max(&self) -> Option<f64> {
        (self.samples > 0).then_some(self.max)
    }

    /// Clears all samples, keeping the error-estimate setting.
    pub fn reset(&mut self) {
        *self = Self::new().with_error_estimate(self.error_estimate_allowed);
    }
}
