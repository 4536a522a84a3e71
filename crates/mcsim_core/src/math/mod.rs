//! Numerical building blocks shared by the simulation layers.
//!
//! - [`distributions`]: standard normal CDF and its inverse
//! - [`interpolation`]: bilinear interpolation on rectangular grids
//! - [`cost_function`]: objective-function interface with finite-difference
//!   gradients

pub mod cost_function;
pub mod distributions;
pub mod interpolation;

pub use cost_function::CostFunction;
pub use distributions::{inverse_norm_cdf, norm_cdf, norm_pdf};
pub use interpolation::BilinearInterpolator;
