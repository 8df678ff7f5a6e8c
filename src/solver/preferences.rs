// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Key/value preference surface.
//!
//! # Example
//!
//! ```
//! use qubo_search::solver::{Preference, PreferenceName};
//!
//! let pref = Preference::parse("tile_size", "256").unwrap();
//! assert_eq!(pref, Preference::TileSize(256));
//! assert_eq!(pref.name(), PreferenceName::TileSize);
//! assert_eq!(pref.value(), "256");
//! ```

use super::{Result, SolverError};
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

/// Preference keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter, EnumCount,
)]
#[strum(serialize_all = "snake_case")]
pub enum PreferenceName {
    Algorithm,
    TileSize,
    Precision,
    Device,
}

/// Search algorithms. Exhaustive search only offers brute force; asking for
/// anything selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum Algorithm {
    #[default]
    #[strum(serialize = "default")]
    Default,
    #[strum(serialize = "brute-force-search")]
    BruteForceSearch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preference {
    Algorithm(Algorithm),
    TileSize(usize),
    /// Read-only: "float" or "double".
    Precision(String),
    /// Read-only: backend identifier.
    Device(String),
}

impl Preference {
    pub fn name(&self) -> PreferenceName {
        match self {
            Preference::Algorithm(_) => PreferenceName::Algorithm,
            Preference::TileSize(_) => PreferenceName::TileSize,
            Preference::Precision(_) => PreferenceName::Precision,
            Preference::Device(_) => PreferenceName::Device,
        }
    }

    pub fn value(&self) -> String {
        match self {
            Preference::Algorithm(algo) => algo.to_string(),
            Preference::TileSize(size) => size.to_string(),
            Preference::Precision(p) | Preference::Device(p) => p.clone(),
        }
    }

    /// Parse a `key = value` pair.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let name: PreferenceName = key
            .parse()
            .map_err(|_| SolverError::Preference(format!("unknown preference '{}'", key)))?;
        let pref = match name {
            // Names this solver does not offer fall back to the default.
            PreferenceName::Algorithm => {
                Preference::Algorithm(value.trim().parse().unwrap_or_default())
            }
            PreferenceName::TileSize => Preference::TileSize(value.trim().parse().map_err(|_| {
                SolverError::Preference("tile_size must be a positive integer".to_string())
            })?),
            PreferenceName::Precision => Preference::Precision(value.to_string()),
            PreferenceName::Device => Preference::Device(value.to_string()),
        };
        Ok(pref)
    }
}
