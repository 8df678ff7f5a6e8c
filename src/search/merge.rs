// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Merge per-worker minima into one result.

use crate::packed::PackedIndex;
use crate::problem::Real;
use crate::worker::WorkerBackend;

/// Global minimum and the indices reaching it, sorted and capped.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMinimum<R: Real> {
    pub energy: R,
    pub indices: Vec<PackedIndex>,
}

/// Combine worker results.
///
/// Every worker at the global minimum contributes its whole tie list; the
/// union is sorted by packed value and truncated to `cap` entries. Sorting
/// makes the outcome independent of how the space was split between workers.
pub fn merge_minima<R, W>(workers: &[W], cap: usize) -> MergedMinimum<R>
where
    R: Real,
    W: WorkerBackend<R>,
{
    let energy = workers
        .iter()
        .map(|worker| worker.current_minimum())
        .fold(R::INFINITY, |a, b| if b < a { b } else { a });

    let mut indices: Vec<PackedIndex> = workers
        .iter()
        .filter(|worker| worker.current_minimum() == energy)
        .flat_map(|worker| worker.tie_list().iter().copied())
        .collect();
    indices.sort_unstable();
    indices.truncate(cap);

    MergedMinimum { energy, indices }
}
