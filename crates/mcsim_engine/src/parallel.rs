//! Sharded parallel sampling with rayon.
//!
//! A [`ShardedModel`] owns one independent [`MonteCarloModel`] per shard,
//! each built by a caller-supplied factory with its own random stream
//! (typically seeded with [`shard_seed`](crate::rng::shard_seed)). A batch
//! of `n` draws is split into near-equal shares that run concurrently;
//! estimates merge the shard accumulators in shard order, so results depend
//! only on the base seed and the shard count, never on thread scheduling.

use mcsim_core::statistics::{PairedStatistics, SampleStatistics};
use mcsim_core::SimulationError;
use rayon::prelude::*;

use crate::model::{estimate_of, Estimate, ModelState, MonteCarloModel, Sampler};
use crate::path::PathGenerator;
use crate::pricer::PathPricer;

/// Monte Carlo model split over independent shards.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mcsim_core::TimeGrid;
/// use mcsim_engine::model::{MonteCarloModel, Sampler};
/// use mcsim_engine::parallel::ShardedModel;
/// use mcsim_engine::path::{EulerPathGenerator, Path};
/// use mcsim_engine::process::BlackScholesProcess;
/// use mcsim_engine::rng::{shard_seed, PseudoRandom};
///
/// let grid = Arc::new(TimeGrid::from_horizon(1.0, 4).unwrap());
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
///
/// let mut model = ShardedModel::new(4, |shard| {
///     let stream = PseudoRandom::new(grid.intervals(), shard_seed(42, shard));
///     let generator = EulerPathGenerator::new(process, stream, Arc::clone(&grid))?;
///     MonteCarloModel::builder(generator, |p: &Path| p.back()).build()
/// })
/// .unwrap();
///
/// let result = model.value_with_samples(10_000).unwrap();
/// assert_eq!(result.samples, 10_000);
/// ```
pub struct ShardedModel<G, P, C> {
    shards: Vec<MonteCarloModel<G, P, C>>,
    state: ModelState,
}

impl<G, P, C> ShardedModel<G, P, C>
where
    G: PathGenerator,
    P: PathPricer,
    C: PathPricer,
{
    /// Builds `shards` models with `factory(shard_index)`.
    ///
    /// # Errors
    ///
    /// `Configuration` if `shards` is zero; otherwise the first factory
    /// error.
    pub fn new<F>(shards: usize, factory: F) -> Result<Self, SimulationError>
    where
        F: FnMut(usize) -> Result<MonteCarloModel<G, P, C>, SimulationError>,
    {
        if shards == 0 {
            return Err(SimulationError::configuration(
                "sharded model requires at least one shard",
            ));
        }
        let shards = (0..shards).map(factory).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            shards,
            state: ModelState::Unconfigured,
        })
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the shard models.
    pub fn shards(&self) -> &[MonteCarloModel<G, P, C>] {
        &self.shards
    }

    /// Returns the number of paths priced across all shards.
    pub fn paths_evaluated(&self) -> usize {
        self.shards.iter().map(MonteCarloModel::paths_evaluated).sum()
    }

    /// Returns the merged raw accumulator.
    pub fn sample_accumulator(&self) -> SampleStatistics {
        let mut merged = SampleStatistics::new();
        for shard in &self.shards {
            merged.merge(shard.sample_accumulator());
        }
        merged.with_error_estimate(self.allows_error_estimate())
    }

    /// Returns the merged `(target, control)` accumulator when a control is
    /// used.
    pub fn paired_accumulator(&self) -> Option<PairedStatistics> {
        let mut merged: Option<PairedStatistics> = None;
        for shard in &self.shards {
            let paired = shard.paired_accumulator()?;
            merged.get_or_insert_with(PairedStatistics::new).merge(paired);
        }
        merged
    }
}

/// Splits `n` into `shards` shares differing by at most one.
fn shares(n: usize, shards: usize) -> Vec<usize> {
    let (base, extra) = (n / shards, n % shards);
    (0..shards).map(|k| base + usize::from(k < extra)).collect()
}

impl<G, P, C> Sampler for ShardedModel<G, P, C>
where
    G: PathGenerator,
    P: PathPricer,
    C: PathPricer,
{
    fn add_samples(&mut self, n: usize) {
        if n > 0 && self.state == ModelState::Unconfigured {
            self.state = ModelState::Sampling;
        }
        let counts = shares(n, self.shards.len());
        self.shards
            .par_iter_mut()
            .zip(counts.into_par_iter())
            .for_each(|(shard, count)| shard.add_samples(count));
    }

    fn samples_per_draw(&self) -> usize {
        self.shards.first().map_or(1, Sampler::samples_per_draw)
    }

    fn estimate(&self) -> Estimate {
        let stats = self.sample_accumulator();
        let paired = self.paired_accumulator();
        let reference = self.shards.first().and_then(MonteCarloModel::control_reference);
        match (paired.as_ref(), reference) {
            (Some(paired), Some(reference)) => estimate_of(&stats, Some((paired, reference))),
            _ => estimate_of(&stats, None),
        }
    }

    fn allows_error_estimate(&self) -> bool {
        self.shards.iter().all(Sampler::allows_error_estimate)
    }

    fn state(&self) -> ModelState {
        self.state
    }

    fn set_state(&mut self, state: ModelState) {
        self.state = state;
        for shard in &mut self.shards {
            shard.set_state(state);
        }
    }
}
