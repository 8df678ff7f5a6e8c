// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The solver facade: lifecycle, preferences, errors and the search driver.

pub mod errors;
pub mod preferences;
pub mod searcher;
pub mod state;

pub use errors::{Result, SolverError, StateError};
pub use preferences::{Algorithm, Preference, PreferenceName};
pub use searcher::BruteForceSearcher;
pub use state::{Phase, SolverState};
