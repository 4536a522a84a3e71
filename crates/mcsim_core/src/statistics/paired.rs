//! Bivariate running statistics for control-variate estimation.

use serde::Serialize;

/// Running statistics of paired `(target, control)` samples.
///
/// Tracks both means, both sums of squared deviations and the co-moment, so
/// that the control-variate corrected estimator
///
/// ```text
/// corrected = mean(target) - mean(control) + reference
/// var       = var(target) + var(control) - 2 cov(target, control)
/// ```
///
/// and its standard error can be read at any point.
///
/// # Examples
///
/// ```rust
/// use mcsim_core::statistics::PairedStatistics;
///
/// let mut stats = PairedStatistics::new();
/// for x in [1.0, 2.0, 3.0, 4.0] {
///     stats.add(x, x);
/// }
///
/// // Perfectly correlated control: the correction removes all variance.
/// assert_eq!(stats.corrected_mean(10.0), 10.0);
/// assert_eq!(stats.corrected_error_estimate(), Some(0.0));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairedStatistics {
    samples: usize,
    mean_target: f64,
    mean_control: f64,
    m2_target: f64,
    m2_control: f64,
    /// Sum of cross deviations.
    c_tc: f64,
    error_estimate_allowed: bool,
}

impl Default for PairedStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl PairedStatistics {
    /// Creates an empty accumulator reporting an error estimate.
    pub fn new() -> Self {
        Self {
            samples: 0,
            mean_target: 0.0,
            mean_control: 0.0,
            m2_target: 0.0,
            m2_control: 0.0,
            c_tc: 0.0,
            error_estimate_allowed: true,
        }
    }

    /// Sets whether an error estimate is reported.
    pub fn with_error_estimate(mut self, allowed: bool) -> Self {
        self.error_estimate_allowed = allowed;
        self
    }

    /// Adds one `(target, control)` pair.
    pub fn add(&mut self, target: f64, control: f64) {
        self.samples += 1;
        let n = self.samples as f64;

        let dt = target - self.mean_target;
        let dc = control - self.mean_control;
        self.mean_target += dt / n;
        self.mean_control += dc / n;

        self.m2_target += dt * (target - self.mean_target);
        self.m2_control += dc * (control - self.mean_control);
        self.c_tc += dt * (control - self.mean_control);
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &PairedStatistics) {
        if other.samples == 0 {
            return;
        }
        if self.samples == 0 {
            let allowed = self.error_estimate_allowed && other.error_estimate_allowed;
            *self = other.clone();
            self.error_estimate_allowed = allowed;
            return;
        }

        let na = self.samples as f64;
        let nb = other.samples as f64;
        let n = na + nb;
        let dt = other.mean_target - self.mean_target;
        let dc = other.mean_control - self.mean_control;

        self.mean_target += dt * nb / n;
        self.mean_control += dc * nb / n;
        self.m2_target += other.m2_target + dt * dt * na * nb / n;
        self.m2_control += other.m2_control + dc * dc * na * nb / n;
        self.c_tc += other.c_tc + dt * dc * na * nb / n;
        self.samples += other.samples;
        self.error_estimate_allowed &= other.error_estimate_allowed;
    }

    /// Returns the number of pairs added.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the mean of the target samples.
    #[inline]
    pub fn target_mean(&self) -> f64 {
        self.mean_target
    }

    /// Returns the mean of the control samples.
    #[inline]
    pub fn control_mean(&self) -> f64 {
        self.mean_control
    }

    /// Returns the unbiased variance of the target samples.
    pub fn target_variance(&self) -> f64 {
        self.unbiased(self.m2_target)
    }

    /// Returns the unbiased variance of the control samples.
    pub fn control_variance(&self) -> f64 {
        self.unbiased(self.m2_control)
    }

    /// Returns the unbiased covariance between target and control.
    pub fn covariance(&self) -> f64 {
        self.unbiased(self.c_tc)
    }

    /// Returns the sample correlation, or `None` when either side is constant.
    pub fn correlation(&self) -> Option<f64> {
        let denom = (self.m2_target * self.m2_control).sqrt();
        (denom > 0.0).then(|| self.c_tc / denom)
    }

    /// Returns `mean(target) - mean(control) + reference`.
    #[inline]
    pub fn corrected_mean(&self, reference: f64) -> f64 {
        self.mean_target - self.mean_control + reference
    }

    /// Returns the unbiased variance of `target - control`.
    pub fn corrected_variance(&self) -> f64 {
        self.unbiased(self.m2_target + self.m2_control - 2.0 * self.c_tc)
            .max(0.0)
    }

    /// Returns the standard error of the corrected mean.
    ///
    /// `None` when error estimation is disabled or fewer than two pairs
    /// have been added.
    pub fn corrected_error_estimate(&self) -> Option<f64> {
        if !self.error_estimate_allowed || self.samples < 2 {
            return None;
        }
        Some((self.corrected_variance() / self.samples as f64).sqrt())
    }

    /// Returns the standard error of the uncorrected target mean.
    pub fn target_error_estimate(&self) -> Option<f64> {
        if !self.error_estimate_allowed || self.samples < 2 {
            return None;
        }
        Some((self.target_variance() / self.samples as f64).sqrt())
    }

    #[inline]
    fn unbiased(&self, moment: f64) -> f64 {
        if self.samples < 2 {
            0.0
        } else {
            moment / (self.samples - 1) as f64
        }
    }
}
