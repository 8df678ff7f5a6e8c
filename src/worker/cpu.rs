// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Thread-parallel CPU backend.
//!
//! Each round is a fork-join region on the backend's own rayon pool: one job
//! per thread, and `run_round` returns after the last job joins. Workers
//! evaluate their range one index at a time straight from the packed form.

use super::{Backend, Job, WorkerBackend, WorkerState};
use crate::packed::PackedIndex;
use crate::problem::{Real, WeightMatrix};
use crate::solver::{Result, SolverError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// CPU worker: scans its range serially.
#[derive(Debug)]
pub struct CpuWorker<R: Real> {
    weights: Arc<WeightMatrix<R>>,
    state: WorkerState<R>,
}

impl<R: Real> CpuWorker<R> {
    pub fn new(weights: Arc<WeightMatrix<R>>) -> Self {
        Self {
            weights,
            state: WorkerState::new(),
        }
    }
}

impl<R: Real> WorkerBackend<R> for CpuWorker<R> {
    fn init_search(&mut self) -> Result<()> {
        self.state.reset();
        Ok(())
    }

    fn search_range(&mut self, begin: PackedIndex, end: PackedIndex) -> Result<()> {
        for x in begin.value()..end.value() {
            let x = PackedIndex::new(x);
            let energy = self.weights.energy(x);
            self.state.observe(x, energy);
        }
        Ok(())
    }

    fn current_minimum(&self) -> R {
        self.state.minimum()
    }

    fn tie_list(&self) -> &[PackedIndex] {
        self.state.ties()
    }
}

/// Worker pool configuration for the CPU.
///
/// The thread count is fixed when the backend is built; the pool holds one
/// worker per thread.
pub struct CpuBackend {
    pool: ThreadPool,
    threads: usize,
}

impl CpuBackend {
    /// One worker per available hardware thread.
    pub fn new() -> Result<Self> {
        let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::with_threads(threads)
    }

    /// Exactly `threads` workers. Zero is a preference error.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(SolverError::Preference(
                "thread count must be a positive integer".to_string(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("qubo-search-{}", idx))
            .build()?;
        tracing::debug!(threads, "cpu backend created");
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl<R: Real> Backend<R> for CpuBackend {
    type Worker = CpuWorker<R>;

    fn device_name(&self) -> &str {
        "cpu"
    }

    fn worker_count(&self) -> usize {
        self.threads
    }

    fn create_worker(
        &self,
        weights: &Arc<WeightMatrix<R>>,
        _tile_size: usize,
    ) -> Result<Self::Worker> {
        Ok(CpuWorker::new(Arc::clone(weights)))
    }

    fn run_round(&self, jobs: Vec<Job<'_, Self::Worker>>) -> Result<()> {
        if jobs.len() == 1 {
            // Nothing to fork.
            return jobs
                .into_iter()
                .try_for_each(|job| job.worker.search_range(job.begin, job.end));
        }
        self.pool.install(|| {
            jobs.into_par_iter()
                .try_for_each(|job| job.worker.search_range(job.begin, job.end))
        })
    }
}
