// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Exact brute-force QUBO search.
//!
//! Given a symmetric `N x N` weight matrix `W` with `N < 64`, the searcher
//! enumerates every binary vector `x` in `{0,1}^N`, evaluates `x^T W x`, and
//! reports the global minimum (or maximum) together with every assignment that
//! reaches it.
//!
//! # Architecture
//!
//! - [`packed`]: a binary vector packed into a `u64`; bit `k` holds variable
//!   `N-1-k`, so the search space is the integer range `[0, 2^N)`.
//! - [`problem`]: the weight matrix and the validated problem. Maximization
//!   is stored as minimization of `-W`.
//! - [`worker`]: the batch search workers behind one capability, with a
//!   multi-threaded CPU backend and a batch device backend.
//! - [`search`]: the fixed-stride tile scheduler and the result merger.
//! - [`solver`]: lifecycle, preferences and the [`BruteForceSearcher`] driver.
//!
//! # Determinism
//!
//! The partition of `[0, 2^N)` into tiles depends only on `N`, the tile size
//! and the worker count. Ties are reported sorted by packed value, and both
//! backends sum energies in the same order, so CPU and device runs agree
//! bit for bit.
//!
//! # Example
//!
//! ```
//! use qubo_search::{BruteForceSearcher, CpuBackend, OptimizeMethod, WeightMatrix};
//!
//! let w = WeightMatrix::<f32>::eye(3);
//! let mut searcher = BruteForceSearcher::new(CpuBackend::new().unwrap());
//! searcher.set_problem(&w, OptimizeMethod::Maximize).unwrap();
//! assert_eq!(searcher.energies().unwrap(), &[3.0]);
//! assert_eq!(searcher.solutions().unwrap()[0].to_string(), "111");
//! ```

pub mod packed;
pub mod problem;
pub mod search;
pub mod solver;
pub mod worker;

pub use packed::{BitVector, PackedIndex};
pub use problem::{OptimizeMethod, Real, WeightMatrix, WeightProblem};
pub use solver::{BruteForceSearcher, Preference, PreferenceName, Result, SolverError};
pub use worker::{CpuBackend, DeviceBackend, HostDevice};
