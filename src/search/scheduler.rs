// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Fixed-stride tile scheduler.
//!
//! The space `[0, 2^N)` is cut into tiles of `T` indices. In each round worker
//! `i` receives `[x + i*T, x + (i+1)*T)` clamped to `2^N`, after which the
//! cursor `x` moves on by `W*T`. The partition depends only on `N`, `T` and
//! the worker count, so every backend scans exactly the same ranges.

use crate::packed::PackedIndex;

/// Default number of indices per tile.
pub const DEFAULT_TILE_SIZE: usize = 1024;

/// One worker's range for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub worker: usize,
    pub begin: PackedIndex,
    pub end: PackedIndex,
}

/// Cursor over `[0, 2^N)` handing out one tile per worker per round.
#[derive(Debug, Clone)]
pub struct TileScheduler {
    tile_size: u64,
    workers: usize,
    cursor: u64,
    end: u64,
}

impl TileScheduler {
    /// Scheduler for an `n`-variable problem.
    ///
    /// The tile is shrunk to `2^n` when the whole space is smaller than one tile.
    /// `requested_tile` and `workers` must be positive.
    pub fn new(n: usize, requested_tile: usize, workers: usize) -> Self {
        debug_assert!(requested_tile > 0 && workers > 0);
        let end = PackedIndex::end_of(n).value();
        let tile_size = (requested_tile as u64).min(end);
        Self {
            tile_size,
            workers,
            cursor: 0,
            end,
        }
    }

    /// Tile size actually used, after shrinking.
    pub fn tile_size(&self) -> usize {
        self.tile_size as usize
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Next unscanned index.
    pub fn cursor(&self) -> PackedIndex {
        PackedIndex::new(self.cursor)
    }

    /// `2^N`.
    pub fn end(&self) -> PackedIndex {
        PackedIndex::new(self.end)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.end
    }

    /// Back to index zero.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Tiles of the current round, in worker order.
    ///
    /// Workers whose clamped range is empty are left out. Since ranges grow with
    /// the worker number, the tiles returned always belong to workers
    /// `0..tiles.len()`.
    pub fn round(&self) -> Vec<Tile> {
        (0..self.workers)
            .map(|worker| {
                let offset = self.tile_size.saturating_mul(worker as u64);
                let begin = self.cursor.saturating_add(offset).min(self.end);
                let end = begin.saturating_add(self.tile_size).min(self.end);
                Tile {
                    worker,
                    begin: PackedIndex::new(begin),
                    end: PackedIndex::new(end),
                }
            })
            .take_while(|tile| tile.begin < tile.end)
            .collect()
    }

    /// Move past the current round. Returns true once the space is covered.
    pub fn advance(&mut self) -> bool {
        let stride = self.tile_size.saturating_mul(self.workers as u64);
        self.cursor = self.cursor.saturating_add(stride).min(self.end);
        self.is_complete()
    }
}
