//! # mcsim_core: Foundation Layer for Monte Carlo Pricing
//!
//! ## Role
//!
//! mcsim_core is the bottom layer of the simulation stack. It owns the pieces
//! that do not depend on how paths are generated:
//! - Time discretisation with mandatory event times (`time_grid`)
//! - Running sample statistics with shard merging (`statistics`)
//! - Structured error taxonomy and day-count conversion (`types`)
//! - Numerical helpers: inverse normal CDF, bilinear interpolation and the
//!   cost-function interface (`math`)
//! - Quoted volatility surfaces with lazy recalculation (`market_data`)
//!
//! ## Usage Example
//!
//! ```rust
//! use mcsim_core::statistics::SampleStatistics;
//! use mcsim_core::time_grid::TimeGrid;
//!
//! let grid = TimeGrid::new(&[1.0, 2.0, 3.0], 6).unwrap();
//! assert_eq!(grid.len(), 10);
//! assert_eq!(grid.find_index(2.0).unwrap(), 6);
//!
//! let mut stats = SampleStatistics::new();
//! for x in [1.0, 2.0, 3.0, 4.0] {
//!     stats.add(x);
//! }
//! assert_eq!(stats.mean(), 2.5);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod statistics;
pub mod time_grid;
pub mod types;

pub use statistics::{PairedStatistics, SampleStatistics};
pub use time_grid::TimeGrid;
pub use types::{SimulationError, Time};
