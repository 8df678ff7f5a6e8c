// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Dense weight matrix storage and energy evaluation.
//!
//! Both backends evaluate `x^T W x` with the same summation order (row by row,
//! columns ascending), so equal assignments produce bit-identical energies
//! whether they are evaluated from a packed index or from a materialized row
//! of `0`/`1` reals. Exact tie detection depends on this.

use super::Real;
use crate::packed::PackedIndex;
use crate::solver::{Result, SolverError};

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix<R: Real> {
    rows: usize,
    cols: usize,
    data: Vec<R>,
}

impl<R: Real> WeightMatrix<R> {
    /// Wrap row-major data.
    ///
    /// Fails with a shape error if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<R>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(SolverError::Shape { rows, cols });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows. Ragged input is a shape error.
    pub fn from_rows(rows: Vec<Vec<R>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != n_cols) {
            return Err(SolverError::Shape {
                rows: n_rows,
                cols: n_cols,
            });
        }
        Self::new(n_rows, n_cols, rows.into_iter().flatten().collect())
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![R::ZERO; rows * cols],
        }
    }

    pub fn eye(dim: usize) -> Self {
        let mut mat = Self::zeros(dim, dim);
        for idx in 0..dim {
            mat.data[idx * dim + idx] = R::ONE;
        }
        mat
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> R {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[R] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[R] {
        &self.data
    }

    /// First `(row, col)` pair with `W[row][col] != W[col][row]`, if any.
    ///
    /// Comparison is exact; there is no tolerance.
    pub fn asymmetry(&self) -> Option<(usize, usize)> {
        if !self.is_square() {
            return Some((0, 0));
        }
        (0..self.rows)
            .flat_map(|row| (row + 1..self.cols).map(move |col| (row, col)))
            .find(|&(row, col)| self.get(row, col) != self.get(col, row))
    }

    pub fn is_symmetric(&self) -> bool {
        self.asymmetry().is_none()
    }

    /// Element-wise negation.
    pub fn negated(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| -v).collect(),
        }
    }

    /// Energy of the packed assignment `x` over a square matrix.
    pub fn energy(&self, x: PackedIndex) -> R {
        let n = self.rows;
        // Reverse so bit k is variable k and set bits come out in ascending order.
        let selected = if n == 0 {
            0
        } else {
            x.value().reverse_bits() >> (64 - n)
        };
        let mut energy = R::ZERO;
        let mut rows = selected;
        while rows != 0 {
            let i = rows.trailing_zeros() as usize;
            rows &= rows - 1;
            let row = self.row(i);
            let mut field = R::ZERO;
            let mut cols = selected;
            while cols != 0 {
                let j = cols.trailing_zeros() as usize;
                cols &= cols - 1;
                field += row[j];
            }
            energy += field;
        }
        energy
    }

    /// Energy of an explicit assignment given as `0`/`1` reals.
    pub fn energy_of_bits(&self, bits: &[R]) -> R {
        debug_assert_eq!(bits.len(), self.cols);
        quadratic_form(&self.data, self.cols, bits)
    }
}

/// `x^T W x` for row-major `weights` of dimension `n` and a `0`/`1` row `bits`.
///
/// This is the batch formulation evaluated by device kernels.
pub fn quadratic_form<R: Real>(weights: &[R], n: usize, bits: &[R]) -> R {
    let mut energy = R::ZERO;
    for (i, &xi) in bits.iter().enumerate().take(n) {
        let mut field = R::ZERO;
        for (&w, &xj) in weights[i * n..(i + 1) * n].iter().zip(bits) {
            field += w * xj;
        }
        energy += xi * field;
    }
    energy
}
