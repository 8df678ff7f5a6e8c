// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Record of scanned ranges, for checking that a run covered `[0, 2^N)` once.

use crate::packed::PackedIndex;
use std::collections::BTreeMap;

/// Union of half-open ranges, kept merged.
#[derive(Debug, Clone, Default)]
pub struct RangeCoverage {
    /// begin -> end, disjoint and non-adjacent.
    ranges: BTreeMap<u64, u64>,
    overlaps: usize,
}

impl RangeCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.overlaps = 0;
    }

    /// Add `[begin, end)`. Returns false (and counts an overlap) if any index
    /// was already covered.
    pub fn insert(&mut self, begin: PackedIndex, end: PackedIndex) -> bool {
        let (mut begin, mut end) = (begin.value(), end.value());
        if begin >= end {
            return true;
        }
        let mut disjoint = true;

        // Absorb a predecessor that touches or overlaps.
        if let Some((&prev_begin, &prev_end)) = self.ranges.range(..=begin).next_back() {
            if prev_end > begin {
                disjoint = false;
            }
            if prev_end >= begin {
                self.ranges.remove(&prev_begin);
                begin = prev_begin;
                end = end.max(prev_end);
            }
        }
        // Absorb successors starting inside or right after the new range.
        while let Some((&next_begin, &next_end)) = self.ranges.range(begin..).next() {
            if next_begin > end {
                break;
            }
            if next_begin < end {
                disjoint = false;
            }
            self.ranges.remove(&next_begin);
            end = end.max(next_end);
        }
        self.ranges.insert(begin, end);

        if !disjoint {
            self.overlaps += 1;
        }
        disjoint
    }

    /// Number of inserts that hit already covered indices.
    pub fn overlaps(&self) -> usize {
        self.overlaps
    }

    /// Merged ranges in ascending order.
    pub fn ranges(&self) -> Vec<(PackedIndex, PackedIndex)> {
        self.ranges
            .iter()
            .map(|(&b, &e)| (PackedIndex::new(b), PackedIndex::new(e)))
            .collect()
    }

    /// True when exactly `[0, end)` was covered, with no index scanned twice.
    pub fn is_exhaustive(&self, end: PackedIndex) -> bool {
        self.overlaps == 0
            && self.ranges.len() == 1
            && self.ranges.get(&0) == Some(&end.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: u64) -> PackedIndex {
        PackedIndex::new(x)
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let mut coverage = RangeCoverage::new();
        assert!(coverage.insert(p(4), p(8)));
        assert!(coverage.insert(p(0), p(4)));
        assert!(coverage.insert(p(8), p(16)));
        assert_eq!(coverage.ranges(), vec![(p(0), p(16))]);
        assert!(coverage.is_exhaustive(p(16)));
    }

    #[test]
    fn test_overlap_detected() {
        let mut coverage = RangeCoverage::new();
        assert!(coverage.insert(p(0), p(8)));
        assert!(!coverage.insert(p(6), p(10)));
        assert_eq!(coverage.overlaps(), 1);
        assert!(!coverage.is_exhaustive(p(10)));
    }

    #[test]
    fn test_gap_is_not_exhaustive() {
        let mut coverage = RangeCoverage::new();
        coverage.insert(p(0), p(4));
        coverage.insert(p(5), p(8));
        assert_eq!(coverage.ranges().len(), 2);
        assert!(!coverage.is_exhaustive(p(8)));
    }

    #[test]
    fn test_range_spanning_several() {
        let mut coverage = RangeCoverage::new();
        coverage.insert(p(2), p(3));
        coverage.insert(p(5), p(6));
        assert!(!coverage.insert(p(0), p(10)));
        assert_eq!(coverage.ranges(), vec![(p(0), p(10))]);
    }
}
