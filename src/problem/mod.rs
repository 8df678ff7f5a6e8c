// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Weight problems: the matrix being minimized and the caller's true direction.
//!
//! A maximization problem is stored negated, once, at assignment time. The
//! search engine therefore only ever minimizes; energies are negated back when
//! they are read out.

pub mod matrix;
pub mod real;

pub use matrix::WeightMatrix;
pub use real::Real;

use crate::packed::MAX_VARIABLES;
use crate::solver::{Result, SolverError};
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Direction of optimization requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OptimizeMethod {
    #[default]
    Minimize,
    Maximize,
}

/// Validated problem, ready for search.
///
/// The matrix is shared read-only with every worker for the lifetime of one
/// problem; `set_problem` on the solver replaces it wholesale.
#[derive(Debug, Clone)]
pub struct WeightProblem<R: Real> {
    weights: Arc<WeightMatrix<R>>,
    method: OptimizeMethod,
}

impl<R: Real> WeightProblem<R> {
    /// Validate `weights` and flip its sign for maximization.
    ///
    /// Fails with a shape error for non-square or non-symmetric input, and with
    /// a size-limit error when `N >= 64`. Nothing is retained on failure.
    pub fn new(weights: &WeightMatrix<R>, method: OptimizeMethod) -> Result<Self> {
        if !weights.is_square() {
            return Err(SolverError::Shape {
                rows: weights.rows(),
                cols: weights.cols(),
            });
        }
        if let Some((row, col)) = weights.asymmetry() {
            return Err(SolverError::NotSymmetric { row, col });
        }
        if weights.rows() >= MAX_VARIABLES {
            return Err(SolverError::SizeLimit { n: weights.rows() });
        }
        let stored = match method {
            OptimizeMethod::Minimize => weights.clone(),
            OptimizeMethod::Maximize => weights.negated(),
        };
        Ok(Self {
            weights: Arc::new(stored),
            method,
        })
    }

    /// Number of variables.
    pub fn size(&self) -> usize {
        self.weights.rows()
    }

    pub fn method(&self) -> OptimizeMethod {
        self.method
    }

    /// The matrix as minimized by the engine (already negated for maximization).
    pub fn weights(&self) -> &Arc<WeightMatrix<R>> {
        &self.weights
    }

    /// Convert an internal (minimized) energy to the caller's sign convention.
    pub fn external_energy(&self, energy: R) -> R {
        match self.method {
            OptimizeMethod::Minimize => energy,
            OptimizeMethod::Maximize => -energy,
        }
    }
}
