//! Sample paths and their generators.

use std::ops::Index;
use std::sync::Arc;

use mcsim_core::{SimulationError, Time, TimeGrid};

use crate::process::Process;
use crate::rng::RandomStream;

/// One realised path: a state value per time grid point.
///
/// The grid is shared, not copied, between all paths of a calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    grid: Arc<TimeGrid>,
    values: Vec<f64>,
}

impl Path {
    /// Creates a zero-valued path on `grid`.
    pub fn new(grid: Arc<TimeGrid>) -> Self {
        let values = vec![0.0; grid.len()];
        Self { grid, values }
    }

    /// Creates a path from explicit values.
    ///
    /// # Errors
    ///
    /// `InputValidation` if `values` does not have one entry per grid point.
    pub fn from_values(grid: Arc<TimeGrid>, values: Vec<f64>) -> Result<Self, SimulationError> {
        if values.len() != grid.len() {
            return Err(SimulationError::input(format!(
                "path has {} values for a grid of {} points",
                values.len(),
                grid.len()
            )));
        }
        Ok(Self { grid, values })
    }

    /// Returns the time grid.
    #[inline]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Returns the state values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the path has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the time of point `i`.
    #[inline]
    pub fn time(&self, i: usize) -> Time {
        self.grid[i]
    }

    /// Returns the initial value.
    #[inline]
    pub fn front(&self) -> f64 {
        self.values[0]
    }

    /// Returns the terminal value.
    #[inline]
    pub fn back(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

impl Index<usize> for Path {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Produces sample paths on a fixed grid.
///
/// Returned paths borrow the generator's internal buffer and are valid
/// until the next call.
pub trait PathGenerator: Send {
    /// Draws fresh noise and returns the resulting path.
    fn next(&mut self) -> &Path;

    /// Returns the path driven by the sign-reversed noise of the last draw.
    fn antithetic(&mut self) -> &Path;

    /// Returns the shared time grid.
    fn grid(&self) -> &Arc<TimeGrid>;

    /// Returns whether the underlying stream supports an error estimate.
    fn allows_error_estimate(&self) -> bool;
}

/// Path generator stepping a [`Process`] along the grid.
///
/// Each interval consumes one standard normal variate, so the random stream
/// must have dimension `grid.intervals()`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::path::{EulerPathGenerator, PathGenerator};
/// use mcsim_engine::process::BlackScholesProcess;
/// use mcsim_engine::rng::PseudoRandom;
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 12).unwrap());
/// let process = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let stream = PseudoRandom::new(grid.intervals(), 42);
///
/// let mut generator = EulerPathGenerator::new(process, stream, grid).unwrap();
/// let path = generator.next();
/// assert_eq!(path.len(), 14);
/// assert_eq!(path.front(), 100.0);
/// ```
#[derive(Debug)]
pub struct EulerPathGenerator<P, R> {
    process: P,
    stream: R,
    grid: Arc<TimeGrid>,
    path: Path,
    normals: Vec<f64>,
}

impl<P: Process, R: RandomStream> EulerPathGenerator<P, R> {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// `Configuration` if the stream dimension differs from the number of
    /// grid intervals.
    pub fn new(process: P, stream: R, grid: Arc<TimeGrid>) -> Result<Self, SimulationError> {
        if stream.dimension() != grid.intervals() {
            return Err(SimulationError::configuration(format!(
                "random stream dimension {} does not match {} grid intervals",
                stream.dimension(),
                grid.intervals()
            )));
        }
        Ok(Self {
            process,
            normals: vec![0.0; grid.intervals()],
            path: Path::new(Arc::clone(&grid)),
            stream,
            grid,
        })
    }

    /// Returns the process.
    #[inline]
    pub fn process(&self) -> &P {
        &self.process
    }

    fn build(&mut self, sign: f64) {
        let times = self.grid.times();
        let values = self.path.values_mut();
        let mut x = self.process.initial_value();
        values[0] = x;
        for (i, &dw) in self.normals.iter().enumerate() {
            let t = times[i];
            x = self.process.evolve(t, x, times[i + 1] - t, sign * dw);
            values[i + 1] = x;
        }
    }
}

impl<P: Process, R: RandomStream> PathGenerator for EulerPathGenerator<P, R> {
    fn next(&mut self) -> &Path {
        self.stream.next_gaussian(&mut self.normals);
        self.build(1.0);
        &self.path
    }

    fn antithetic(&mut self) -> &Path {
        self.build(-1.0);
        &self.path
    }

    fn grid(&self) -> &Arc<TimeGrid> {
        &self.grid
    }

    fn allows_error_estimate(&self) -> bool {
        self.stream.allows_error_estimate()
    }
}
