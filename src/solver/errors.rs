// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the solver.
//!
//! Every error is a caller or environment fault raised at the offending call;
//! nothing is retried and no state is changed by a failing call.

use crate::worker::device::DeviceError;
use thiserror::Error;

/// Operation invoked out of lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("problem is not set")]
    NoProblem,

    #[error("not prepared, call prepare() in advance")]
    NotPrepared,
}

/// All failures reported by the crate.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Matrix dimensions do not fit the operation (non-square, ragged, or
    /// inconsistent with the data supplied).
    #[error("invalid matrix shape {rows}x{cols}")]
    Shape { rows: usize, cols: usize },

    /// Square matrix whose `(row, col)` and `(col, row)` entries differ.
    #[error("matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },

    #[error("N must be smaller than 64, N={n}")]
    SizeLimit { n: usize },

    #[error("invalid preference: {0}")]
    Preference(String),

    #[error(transparent)]
    State(#[from] StateError),

    /// The device context that raised this must be treated as lost.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SolverError {
    /// True for the shape family (`Shape`, `NotSymmetric`).
    pub fn is_shape_error(&self) -> bool {
        matches!(self, SolverError::Shape { .. } | SolverError::NotSymmetric { .. })
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
