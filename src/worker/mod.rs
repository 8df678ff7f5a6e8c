// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Batch search workers.
//!
//! A worker scans contiguous index ranges and keeps the lowest energy it has
//! seen together with every index that reached it. Workers are created by a
//! [`Backend`], which also decides how the jobs of one scheduling round run:
//!
//! - [`cpu::CpuBackend`]: fork-join over a rayon pool, one job per thread.
//! - [`device::DeviceBackend`]: jobs enqueue kernels on a shared device queue.
//!
//! The scheduler and merger see only the [`WorkerBackend`] capability, so the
//! two backends are interchangeable and must agree exactly on results.
//!
//! # Example
//!
//! ```
//! use qubo_search::packed::PackedIndex;
//! use qubo_search::worker::WorkerState;
//!
//! let mut state = WorkerState::<f64>::new();
//! state.observe(PackedIndex::new(3), -1.0);
//! state.observe(PackedIndex::new(4), -2.0);
//! state.observe(PackedIndex::new(7), -2.0);
//! assert_eq!(state.minimum(), -2.0);
//! assert_eq!(state.ties(), &[PackedIndex::new(4), PackedIndex::new(7)]);
//! ```

pub mod cpu;
pub mod device;

pub use cpu::{CpuBackend, CpuWorker};
pub use device::{DeviceBackend, DeviceProvider, DeviceWorker, HostDevice};

use crate::packed::PackedIndex;
use crate::problem::{Real, WeightMatrix};
use crate::solver::Result;
use std::sync::Arc;

/// Running minimum and the (unbounded) list of indices that attain it.
#[derive(Debug, Clone)]
pub struct WorkerState<R: Real> {
    minimum: R,
    ties: Vec<PackedIndex>,
}

impl<R: Real> WorkerState<R> {
    pub fn new() -> Self {
        Self {
            minimum: R::INFINITY,
            ties: Vec::new(),
        }
    }

    /// Back to `+inf` with no ties.
    pub fn reset(&mut self) {
        self.minimum = R::INFINITY;
        self.ties.clear();
    }

    /// Lower the minimum to `energy` if it is smaller, dropping older ties.
    ///
    /// Returns true when indices at `energy` belong in the tie list.
    pub fn offer(&mut self, energy: R) -> bool {
        if energy < self.minimum {
            self.minimum = energy;
            self.ties.clear();
        }
        energy == self.minimum
    }

    /// Apply the update rule to one evaluated index.
    #[inline]
    pub fn observe(&mut self, x: PackedIndex, energy: R) {
        if self.offer(energy) {
            self.ties.push(x);
        }
    }

    /// Append indices already known to sit at the current minimum.
    pub fn extend_ties<I: IntoIterator<Item = PackedIndex>>(&mut self, ties: I) {
        self.ties.extend(ties);
    }

    pub fn minimum(&self) -> R {
        self.minimum
    }

    pub fn ties(&self) -> &[PackedIndex] {
        &self.ties
    }
}

impl<R: Real> Default for WorkerState<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability shared by CPU and device workers.
///
/// A worker is mutated only by its own `search_range` calls and read by the
/// merger after a round has completed.
pub trait WorkerBackend<R: Real>: Send {
    /// Reset to `+inf` with an empty tie list.
    fn init_search(&mut self) -> Result<()>;

    /// Evaluate every index in `[begin, end)` and fold it into the state.
    fn search_range(&mut self, begin: PackedIndex, end: PackedIndex) -> Result<()>;

    fn current_minimum(&self) -> R;

    fn tie_list(&self) -> &[PackedIndex];
}

/// One worker's assignment for a round.
pub struct Job<'a, W> {
    pub worker: &'a mut W,
    pub begin: PackedIndex,
    pub end: PackedIndex,
}

/// Factory for workers plus the execution model of a round.
pub trait Backend<R: Real> {
    type Worker: WorkerBackend<R>;

    /// Identifier reported by the `device` preference.
    fn device_name(&self) -> &str;

    /// Number of workers the pool holds, i.e. tiles dispatched per round.
    fn worker_count(&self) -> usize;

    /// Build a worker bound to `weights`, sized for tiles of `tile_size` indices.
    fn create_worker(&self, weights: &Arc<WeightMatrix<R>>, tile_size: usize)
        -> Result<Self::Worker>;

    /// Run all jobs of one round. Returns only after every job has finished.
    fn run_round(&self, jobs: Vec<Job<'_, Self::Worker>>) -> Result<()>;
}
