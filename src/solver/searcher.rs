// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Exhaustive QUBO search driver.
//!
//! The searcher owns the problem, the worker pool and the tile scheduler, and
//! walks them through the lifecycle in [`super::state`]. It is generic over the
//! [`Backend`], so the CPU and device paths share every line of scheduling and
//! merging.
//!
//! # Example
//!
//! ```
//! use qubo_search::problem::{OptimizeMethod, WeightMatrix};
//! use qubo_search::solver::BruteForceSearcher;
//! use qubo_search::worker::CpuBackend;
//!
//! let w = WeightMatrix::from_rows(vec![
//!     vec![-1.0f64, 2.0, 0.0],
//!     vec![2.0, -1.0, 0.0],
//!     vec![0.0, 0.0, -1.0],
//! ])
//! .unwrap();
//!
//! let mut searcher = BruteForceSearcher::new(CpuBackend::with_threads(2).unwrap());
//! searcher.set_problem(&w, OptimizeMethod::Minimize).unwrap();
//! searcher.search().unwrap();
//!
//! assert_eq!(searcher.minimum_energy().unwrap(), -2.0);
//! let solutions: Vec<String> = searcher
//!     .solutions()
//!     .unwrap()
//!     .iter()
//!     .map(|x| x.to_string())
//!     .collect();
//! assert_eq!(solutions, vec!["011", "101"]);
//! ```

use super::errors::StateError;
use super::preferences::{Algorithm, Preference, PreferenceName};
use super::state::SolverState;
use super::{Result, SolverError};
use crate::packed::{BitVector, PackedIndex};
use crate::problem::{OptimizeMethod, Real, WeightMatrix, WeightProblem};
#[cfg(feature = "range_coverage")]
use crate::search::RangeCoverage;
use crate::search::{merge_minima, TileScheduler, DEFAULT_TILE_SIZE};
use crate::worker::{Backend, Job, WorkerBackend};

/// Brute-force searcher over `[0, 2^N)`.
pub struct BruteForceSearcher<R: Real, B: Backend<R>> {
    backend: B,

    /// Requested tile size. The effective size lives in the scheduler.
    tile_size: usize,

    state: SolverState,
    problem: Option<WeightProblem<R>>,
    scheduler: Option<TileScheduler>,

    /// One worker per backend slot, built at the first `prepare` after a new
    /// problem and reused while the effective tile size stays the same.
    workers: Vec<B::Worker>,
    worker_tile: usize,

    /// Internal (minimized) energy of the last materialized solution.
    minimum: R,
    solutions: Vec<BitVector>,
    energies: Vec<R>,

    #[cfg(feature = "range_coverage")]
    coverage: RangeCoverage,
}

impl<R: Real, B: Backend<R>> BruteForceSearcher<R, B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tile_size: DEFAULT_TILE_SIZE,
            state: SolverState::new(),
            problem: None,
            scheduler: None,
            workers: Vec::new(),
            worker_tile: 0,
            minimum: R::INFINITY,
            solutions: Vec::new(),
            energies: Vec::new(),
            #[cfg(feature = "range_coverage")]
            coverage: RangeCoverage::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    /// Validate and install a new problem.
    ///
    /// On error the previous problem, workers and results are left untouched.
    pub fn set_problem(
        &mut self,
        weights: &WeightMatrix<R>,
        method: OptimizeMethod,
    ) -> Result<()> {
        let problem = WeightProblem::new(weights, method)?;
        tracing::debug!("problem set: N={}, method={}", problem.size(), method);
        self.release_workers();
        self.clear_results();
        self.problem = Some(problem);
        self.state.problem_assigned();
        Ok(())
    }

    fn problem(&self) -> Result<&WeightProblem<R>> {
        self.problem.as_ref().ok_or(SolverError::State(StateError::NoProblem))
    }

    /// Number of variables of the current problem.
    pub fn problem_size(&self) -> Result<usize> {
        Ok(self.problem()?.size())
    }

    pub fn optimize_method(&self) -> Result<OptimizeMethod> {
        Ok(self.problem()?.method())
    }

    // Preferences

    /// Requested tile size (before any shrink to `2^N`).
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Tile size in use by the current scan, once prepared.
    pub fn effective_tile_size(&self) -> Option<usize> {
        self.scheduler.as_ref().map(TileScheduler::tile_size)
    }

    pub fn algorithm(&self) -> Algorithm {
        Algorithm::BruteForceSearch
    }

    /// Any request selects brute-force search, the only algorithm offered.
    pub fn select_algorithm(&mut self, _requested: Algorithm) -> Algorithm {
        Algorithm::BruteForceSearch
    }

    pub fn preferences(&self) -> Vec<Preference> {
        vec![
            Preference::Algorithm(self.algorithm()),
            Preference::TileSize(self.tile_size),
            Preference::Precision(R::PRECISION.to_string()),
            Preference::Device(self.backend.device_name().to_string()),
        ]
    }

    pub fn preference(&self, name: PreferenceName) -> Preference {
        match name {
            PreferenceName::Algorithm => Preference::Algorithm(self.algorithm()),
            PreferenceName::TileSize => Preference::TileSize(self.tile_size),
            PreferenceName::Precision => Preference::Precision(R::PRECISION.to_string()),
            PreferenceName::Device => {
                Preference::Device(self.backend.device_name().to_string())
            }
        }
    }

    fn check_preference(pref: &Preference) -> Result<()> {
        match pref {
            Preference::Algorithm(_) => Ok(()),
            Preference::TileSize(0) => Err(SolverError::Preference(
                "tile_size must be a positive integer".to_string(),
            )),
            Preference::TileSize(_) => Ok(()),
            Preference::Precision(_) | Preference::Device(_) => Err(SolverError::Preference(
                format!("{} is read-only", pref.name()),
            )),
        }
    }

    /// Apply one preference.
    ///
    /// A new tile size is picked up by the next `prepare`; the current scan
    /// keeps its stride and `Prepared` stays set.
    pub fn set_preference(&mut self, pref: Preference) -> Result<()> {
        Self::check_preference(&pref)?;
        match pref {
            Preference::Algorithm(requested) => {
                self.select_algorithm(requested);
            }
            Preference::TileSize(size) => self.tile_size = size,
            Preference::Precision(_) | Preference::Device(_) => {}
        }
        Ok(())
    }

    /// Apply several preferences, all or none.
    pub fn set_preferences<I>(&mut self, prefs: I) -> Result<()>
    where
        I: IntoIterator<Item = Preference>,
    {
        let prefs: Vec<Preference> = prefs.into_iter().collect();
        for pref in &prefs {
            Self::check_preference(pref)?;
        }
        for pref in prefs {
            self.set_preference(pref)?;
        }
        Ok(())
    }

    /// Parse and apply a `key = value` pair.
    pub fn set_preference_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_preference(Preference::parse(key, value)?)
    }

    // Search steps

    /// Size the worker pool, reset every worker and rewind the cursor to 0.
    ///
    /// The previous scan is discarded before any worker is built. If building
    /// fails (a device out of memory, say) the solver is left with its problem
    /// set and unprepared, and the next read retries `prepare`.
    pub fn prepare(&mut self) -> Result<()> {
        self.state.require_problem()?;
        let problem = self.problem()?;
        let n = problem.size();
        let weights = problem.weights().clone();

        self.state.invalidate_prepared();
        self.scheduler = None;
        self.clear_results();

        let scheduler = TileScheduler::new(n, self.tile_size, self.backend.worker_count());
        if scheduler.tile_size() < self.tile_size {
            tracing::info!(
                "tile size {} exceeds 2^N, using {}",
                self.tile_size,
                scheduler.tile_size()
            );
        }

        if self.workers.is_empty() || self.worker_tile != scheduler.tile_size() {
            self.release_workers();
            let mut workers = Vec::with_capacity(scheduler.workers());
            for _ in 0..scheduler.workers() {
                workers.push(self.backend.create_worker(&weights, scheduler.tile_size())?);
            }
            self.workers = workers;
            self.worker_tile = scheduler.tile_size();
        }
        for worker in &mut self.workers {
            worker.init_search()?;
        }

        tracing::debug!(
            "prepared: N={}, tile size={}, workers={}, device={}",
            n,
            scheduler.tile_size(),
            scheduler.workers(),
            self.backend.device_name()
        );
        self.scheduler = Some(scheduler);
        #[cfg(feature = "range_coverage")]
        self.coverage.clear();
        self.state.prepared()?;
        Ok(())
    }

    /// Run one round: every worker scans its tile, then the cursor advances.
    ///
    /// Returns whether the whole space has been scanned, and the cursor.
    pub fn search_range(&mut self) -> Result<(bool, PackedIndex)> {
        self.state.round_started()?;
        let scheduler = self
            .scheduler
            .as_mut()
            .ok_or(SolverError::State(StateError::NotPrepared))?;

        let tiles = scheduler.round();
        #[cfg(feature = "range_coverage")]
        for tile in &tiles {
            self.coverage.insert(tile.begin, tile.end);
        }
        let jobs: Vec<Job<'_, B::Worker>> = self
            .workers
            .iter_mut()
            .zip(&tiles)
            .map(|(worker, tile)| Job {
                worker,
                begin: tile.begin,
                end: tile.end,
            })
            .collect();
        self.backend.run_round(jobs)?;

        let complete = scheduler.advance();
        tracing::trace!("round done: cursor={} of {}", scheduler.cursor(), scheduler.end());
        Ok((complete, scheduler.cursor()))
    }

    /// True once the cursor has reached `2^N`.
    pub fn is_search_complete(&self) -> bool {
        self.state.is_prepared()
            && self.scheduler.as_ref().is_some_and(TileScheduler::is_complete)
    }

    /// Merge worker results into the solution list.
    ///
    /// Uses whatever has been scanned so far; call after the last round for
    /// the global optimum.
    pub fn make_solution(&mut self) -> Result<()> {
        self.state.require_prepared()?;
        let cap = self
            .effective_tile_size()
            .ok_or(SolverError::State(StateError::NotPrepared))?;
        let n = self.problem()?.size();

        #[cfg(feature = "range_coverage")]
        self.check_coverage();

        let merged = merge_minima(&self.workers, cap);
        self.minimum = merged.energy;
        self.solutions = merged.indices.iter().map(|x| x.decode(n)).collect();
        self.energies.clear();
        self.state.solution_materialized()?;
        tracing::info!(
            "solution: minimum energy={}, solutions={}",
            self.problem()?.external_energy(self.minimum),
            self.solutions.len()
        );
        Ok(())
    }

    /// Fill the energy vector from the materialized minimum.
    pub fn calculate_energy(&mut self) -> Result<()> {
        self.state.require_prepared()?;
        if !self.state.is_solution_available() {
            self.make_solution()?;
        }
        let energy = self.problem()?.external_energy(self.minimum);
        self.energies = vec![energy; self.solutions.len().max(1)];
        self.state.energy_computed()?;
        Ok(())
    }

    /// Prepare, scan the whole space and materialize the solution.
    pub fn search(&mut self) -> Result<()> {
        self.prepare()?;
        while !self.search_range()?.0 {}
        self.make_solution()
    }

    /// Run whatever steps are missing to have a full scan materialized.
    fn complete(&mut self) -> Result<()> {
        self.state.require_problem()?;
        if !self.state.is_prepared() {
            self.prepare()?;
        }
        while !self.is_search_complete() {
            self.search_range()?;
        }
        if !self.state.is_solution_available() {
            self.make_solution()?;
        }
        Ok(())
    }

    // Results

    /// Optimal assignments, sorted by packed value and capped at the tile size.
    pub fn solutions(&mut self) -> Result<&[BitVector]> {
        self.complete()?;
        Ok(&self.solutions)
    }

    /// One entry per solution (at least one), all equal to the optimum.
    pub fn energies(&mut self) -> Result<&[R]> {
        self.complete()?;
        if !self.state.is_energy_available() {
            self.calculate_energy()?;
        }
        Ok(&self.energies)
    }

    /// The optimum in the caller's sign convention.
    pub fn minimum_energy(&mut self) -> Result<R> {
        self.complete()?;
        Ok(self.problem()?.external_energy(self.minimum))
    }

    /// Drop the worker pool. The problem stays set; the next read prepares again.
    pub fn release(&mut self) {
        self.release_workers();
        self.clear_results();
        self.state.invalidate_prepared();
    }

    fn release_workers(&mut self) {
        self.workers.clear();
        self.worker_tile = 0;
        self.scheduler = None;
    }

    fn clear_results(&mut self) {
        self.minimum = R::INFINITY;
        self.solutions.clear();
        self.energies.clear();
    }

    #[cfg(feature = "range_coverage")]
    fn check_coverage(&self) {
        let Some(scheduler) = self.scheduler.as_ref() else {
            return;
        };
        if !scheduler.is_complete() {
            return;
        }
        let exhaustive = self.coverage.is_exhaustive(scheduler.end());
        if !exhaustive || self.coverage.overlaps() > 0 {
            tracing::error!(
                "range coverage check failed: ranges={:?}, overlaps={}",
                self.coverage.ranges(),
                self.coverage.overlaps()
            );
        }
        debug_assert!(exhaustive && self.coverage.overlaps() == 0);
    }
}
