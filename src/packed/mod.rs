// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Packed-index codec.
//!
//! The search enumerates assignments as integers in `[0, 2^N)`. Bit k (counting
//! from the least significant bit) holds variable `N - 1 - k`, so the most
//! significant used bit is the first element of the explicit vector.
//!
//! # Examples
//!
//! ```
//! use qubo_search::packed::{BitVector, PackedIndex};
//!
//! let x = PackedIndex::new(0b0110);
//! let bits = x.decode(4);
//! assert_eq!(bits.as_slice(), &[0, 1, 1, 0]);
//! assert_eq!(format!("{}", bits), "0110");
//! assert_eq!(PackedIndex::encode(&bits), x);
//!
//! let v = BitVector::from_bits(vec![1, 0, 0]);
//! assert_eq!(PackedIndex::encode(&v).value(), 4);
//! ```

use std::fmt;

/// Largest supported problem size is `MAX_VARIABLES - 1`.
///
/// `2^N` must fit in a `u64` cursor, including the one-past-the-end value.
pub const MAX_VARIABLES: usize = 64;

/// Dense integer encoding of a binary assignment.
///
/// Ordering is numeric, which is the tie-break order for equal energies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackedIndex(u64);

impl PackedIndex {
    pub const ZERO: PackedIndex = PackedIndex(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// One past the last index of an `n`-variable problem, i.e. `2^n`.
    ///
    /// `n` must be below [`MAX_VARIABLES`].
    pub const fn end_of(n: usize) -> Self {
        Self(1u64 << n)
    }

    /// Is variable `position` set, for an `n`-variable problem?
    #[inline]
    pub fn bit(self, position: usize, n: usize) -> bool {
        (self.0 >> (n - 1 - position)) & 1 != 0
    }

    /// Expand to an explicit vector of length `n`.
    ///
    /// Total for `self < 2^n`; higher bits are ignored.
    pub fn decode(self, n: usize) -> BitVector {
        BitVector((0..n).map(|position| self.bit(position, n) as u8).collect())
    }

    /// Inverse of [`decode`](Self::decode).
    pub fn encode(bits: &BitVector) -> Self {
        Self(
            bits.0
                .iter()
                .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit & 1)),
        )
    }
}

impl From<u64> for PackedIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for PackedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Explicit assignment: one `0`/`1` entry per variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BitVector(Vec<u8>);

impl BitVector {
    /// Wrap raw values. Any non-zero entry counts as `1` when encoded.
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Convert to a numeric vector, e.g. for evaluating `x^T W x` externally.
    pub fn to_reals<R: crate::problem::Real>(&self) -> Vec<R> {
        self.0
            .iter()
            .map(|&bit| if bit != 0 { R::ONE } else { R::ZERO })
            .collect()
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}
