//! Rayon-backed sweeps for the non-cached estimator.
//!
//! The statistics cache is single-writer and stays on one thread. Estimator
//! playouts for distinct army pairs share nothing, so they fan out across
//! cores here.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::battle::{Army, Rng};
use crate::estimator::{estimate_battle, EstimateRates};

/// Worker thread count for parallel sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. 0 means the global Rayon pool (all cores).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run `f` on this pool. With 0 workers the global pool runs it;
    /// otherwise a temporary pool with that many threads is built.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("Rayon thread pool");
            pool.install(f)
        }
    }
}

/// Estimate every pair in parallel. Results keep input order, and pair `i`
/// draws from the child seed `seed + i`, so a run reproduces regardless of
/// worker count or scheduling.
pub fn estimate_pairs(
    pairs: &[(Army, Army)],
    seed: u64,
    pool: &WorkerPool,
) -> Vec<EstimateRates> {
    pool.install(|| {
        pairs
            .par_iter()
            .enumerate()
            .map(|(index, (side_a, side_b))| {
                let mut rng = Rng::new(seed.wrapping_add(index as u64));
                estimate_battle(side_a, side_b, &mut rng)
            })
            .collect()
    })
}
