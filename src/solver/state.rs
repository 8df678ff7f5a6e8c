// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Solver lifecycle.
//!
//! ```text
//! Unset --set_problem--> ProblemSet --prepare--> Prepared
//!                            ^                     |  search rounds, materialize,
//!                            |                     |  energy read
//!                            +----set_problem------+
//! ```
//!
//! Once prepared, the solution and the energies become available independently.
//! Invalidation cascades downwards only: a new problem clears everything after
//! it, losing `Prepared` clears both results, and the two results are always
//! dropped together so one never outlives the other.

use super::errors::StateError;
use strum_macros::Display;

/// Coarse position in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Unset,
    #[strum(serialize = "problem set")]
    ProblemSet,
    Prepared,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverState {
    problem_set: bool,
    prepared: bool,
    solution_available: bool,
    energy_available: bool,
}

impl SolverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.prepared {
            Phase::Prepared
        } else if self.problem_set {
            Phase::ProblemSet
        } else {
            Phase::Unset
        }
    }

    pub fn is_problem_set(&self) -> bool {
        self.problem_set
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_solution_available(&self) -> bool {
        self.solution_available
    }

    pub fn is_energy_available(&self) -> bool {
        self.energy_available
    }

    pub fn require_problem(&self) -> Result<(), StateError> {
        if self.problem_set {
            Ok(())
        } else {
            Err(StateError::NoProblem)
        }
    }

    /// `NoProblem` takes precedence over `NotPrepared`.
    pub fn require_prepared(&self) -> Result<(), StateError> {
        self.require_problem()?;
        if self.prepared {
            Ok(())
        } else {
            Err(StateError::NotPrepared)
        }
    }

    /// A new problem was committed.
    pub fn problem_assigned(&mut self) {
        *self = Self {
            problem_set: true,
            ..Self::default()
        };
    }

    /// Workers and cursor were (re)initialized.
    pub fn prepared(&mut self) -> Result<(), StateError> {
        self.require_problem()?;
        self.prepared = true;
        self.clear_results();
        Ok(())
    }

    /// A search round is about to mutate worker state.
    pub fn round_started(&mut self) -> Result<(), StateError> {
        self.require_prepared()?;
        self.clear_results();
        Ok(())
    }

    pub fn solution_materialized(&mut self) -> Result<(), StateError> {
        self.require_prepared()?;
        self.solution_available = true;
        Ok(())
    }

    pub fn energy_computed(&mut self) -> Result<(), StateError> {
        self.require_prepared()?;
        self.energy_available = true;
        Ok(())
    }

    /// Drop `Prepared` and everything derived from it; keeps the problem.
    pub fn invalidate_prepared(&mut self) {
        self.prepared = false;
        self.clear_results();
    }

    fn clear_results(&mut self) {
        self.solution_available = false;
        self.energy_available = false;
    }
}
