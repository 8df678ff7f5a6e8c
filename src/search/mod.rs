// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Backend-agnostic parts of the exhaustive search: partitioning the index
//! space into tiles and merging what the workers found.

pub mod coverage;
pub mod merge;
pub mod scheduler;

pub use coverage::RangeCoverage;
pub use merge::{merge_minima, MergedMinimum};
pub use scheduler::{Tile, TileScheduler, DEFAULT_TILE_SIZE};
