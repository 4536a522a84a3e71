//! Bilinear interpolation on a rectangular grid.

use crate::types::InterpolationError;
use num_traits::Float;

/// Bilinear interpolator over `zs[i][j] = z(xs[i], ys[j])`.
///
/// Generic over the floating-point type so the same surface code serves
/// `f32` snapshots as well as `f64`.
///
/// # Example
///
/// ```
/// use mcsim_core::math::BilinearInterpolator;
///
/// let xs: [f64; 3] = [0.0, 1.0, 2.0];
/// let ys = [0.0, 1.0];
/// let zs = vec![vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]];
///
/// let interp = BilinearInterpolator::new(&xs, &ys, zs).unwrap();
/// assert!((interp.interpolate(0.5, 0.5).unwrap() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BilinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    zs: Vec<Vec<T>>,
}

impl<T: Float> BilinearInterpolator<T> {
    /// Builds an interpolator from strictly increasing axes and row-major values.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if either axis has fewer than two points
    /// - `NonMonotonicData` if an axis is not strictly increasing
    /// - `InvalidInput` if `zs` does not have `xs.len()` rows of `ys.len()` values
    pub fn new(xs: &[T], ys: &[T], zs: Vec<Vec<T>>) -> Result<Self, InterpolationError> {
        for axis in [xs, ys] {
            if axis.len() < 2 {
                return Err(InterpolationError::InsufficientData {
                    got: axis.len(),
                    need: 2,
                });
            }
            if let Some(index) = axis.windows(2).position(|w| w[1] <= w[0]) {
                return Err(InterpolationError::NonMonotonicData { index: index + 1 });
            }
        }

        if zs.len() != xs.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "Grid rows ({}) must match x-axis length ({})",
                zs.len(),
                xs.len()
            )));
        }
        if let Some((i, row)) = zs.iter().enumerate().find(|(_, r)| r.len() != ys.len()) {
            return Err(InterpolationError::InvalidInput(format!(
                "Grid row {} length ({}) must match y-axis length ({})",
                i,
                row.len(),
                ys.len()
            )));
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            zs,
        })
    }

    /// Interpolates at `(x, y)` inside the grid domain.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if either coordinate lies outside its axis range.
    pub fn interpolate(&self, x: T, y: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain_x();
        let (y_min, y_max) = self.domain_y();

        for (v, lo, hi) in [(x, x_min, x_max), (y, y_min, y_max)] {
            if v.is_nan() || v < lo || v > hi {
                return Err(InterpolationError::OutOfBounds {
                    x: v.to_f64().unwrap_or(f64::NAN),
                    min: lo.to_f64().unwrap_or(f64::NAN),
                    max: hi.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(self.evaluate(x, y))
    }

    /// Interpolates with flat extrapolation outside the grid.
    ///
    /// Coordinates are clamped to the axis ranges first.
    pub fn interpolate_flat(&self, x: T, y: T) -> T {
        let (x_min, x_max) = self.domain_x();
        let (y_min, y_max) = self.domain_y();
        self.evaluate(x.max(x_min).min(x_max), y.max(y_min).min(y_max))
    }

    /// Returns the x-axis range.
    #[inline]
    pub fn domain_x(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Returns the y-axis range.
    #[inline]
    pub fn domain_y(&self) -> (T, T) {
        (self.ys[0], self.ys[self.ys.len() - 1])
    }

    /// Returns the x-axis coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Returns the y-axis coordinates.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Returns the grid values.
    #[inline]
    pub fn zs(&self) -> &[Vec<T>] {
        &self.zs
    }

    fn evaluate(&self, x: T, y: T) -> T {
        let i = cell_index(&self.xs, x);
        let j = cell_index(&self.ys, y);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[j], self.ys[j + 1]);
        let z00 = self.zs[i][j];
        let z10 = self.zs[i + 1][j];
        let z01 = self.zs[i][j + 1];
        let z11 = self.zs[i + 1][j + 1];

        let u = (x - x0) / (x1 - x0);
        let v = (y - y0) / (y1 - y0);
        let one = T::one();
        (one - u) * (one - v) * z00 + u * (one - v) * z10 + (one - u) * v * z01 + u * v * z11
    }
}

/// Index of the left node of the cell containing `x`, clamped to the last cell.
#[inline]
fn cell_index<T: Float>(axis: &[T], x: T) -> usize {
    let pos = axis.partition_point(|&a| a <= x);
    pos.saturating_sub(1).min(axis.len() - 2)
}
