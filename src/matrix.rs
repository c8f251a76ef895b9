//! This module provides a coordinate-addressed builder for square sparse matrices.
//!
//! The diagnostic checks describe their sparse inputs the way one would write
//! them on paper: every entry is zero unless it is explicitly assigned, and an
//! assignment names a `(row, col)` coordinate and a value. [`SparseBuilder`]
//! records those assignments and assembles a [`faer::sparse::SparseColMat`]
//! from them once the matrix is complete.
//!
//! Assignment semantics:
//! - A later assignment to the same coordinate overwrites the earlier one.
//! - Assigning `0.0` stores nothing. If the coordinate held a nonzero, it is removed.
//! - Coordinates outside the matrix are rejected.

use crate::error::{CheckError, CheckErrorKind};
use faer::{
    Mat,
    sparse::{SparseColMat, Triplet},
};
use std::collections::BTreeMap;

/// Collects `(row, col, value)` assignments for an `n x n` sparse matrix.
///
/// Entries are kept in a [`BTreeMap`] keyed by `(col, row)`, so the triplets
/// handed to `faer` are already in column-major order and free of duplicates.
#[derive(Debug, Clone)]
pub struct SparseBuilder {
    n: usize,
    entries: BTreeMap<(usize, usize), f64>,
}

impl SparseBuilder {
    /// Creates a builder for an `n x n` matrix with every entry zero.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the dimension of the square matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Returns the number of stored nonzero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Returns the value currently assigned at `(row, col)`, or zero.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries.get(&(col, row)).copied().unwrap_or(0.0)
    }

    /// Assigns `value` to the entry at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<&mut Self, CheckError> {
        if row >= self.n {
            return Err(CheckErrorKind::DimensionMismatch {
                context: "sparse assignment (row)",
                expected: self.n,
                actual: row,
            }
            .into());
        }
        if col >= self.n {
            return Err(CheckErrorKind::DimensionMismatch {
                context: "sparse assignment (column)",
                expected: self.n,
                actual: col,
            }
            .into());
        }

        if value == 0.0 {
            self.entries.remove(&(col, row));
        } else {
            self.entries.insert((col, row), value);
        }
        Ok(self)
    }

    /// Returns the dense equivalent of the assigned entries.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::zeros(self.n, self.n);
        for (&(col, row), &val) in &self.entries {
            dense[(row, col)] = val;
        }
        dense
    }

    /// Assembles the compressed sparse column matrix.
    pub fn build(&self) -> Result<SparseColMat<usize, f64>, CheckError> {
        let triplets: Vec<Triplet<usize, usize, f64>> = self
            .entries
            .iter()
            .map(|(&(col, row), &val)| Triplet { row, col, val })
            .collect();

        SparseColMat::try_new_from_triplets(self.n, self.n, &triplets)
            .map_err(|e| CheckErrorKind::SparseConstruction(format!("{e:?}")).into())
    }
}

/// Builds the symmetric tridiagonal matrix with `diag` on the main diagonal
/// and `off` on the first sub- and super-diagonals.
pub fn symmetric_tridiagonal(
    n: usize,
    diag: f64,
    off: f64,
) -> Result<SparseColMat<usize, f64>, CheckError> {
    let mut builder = SparseBuilder::new(n);
    for i in 0..n {
        builder.set(i, i, diag)?;
        if i > 0 {
            builder.set(i, i - 1, off)?;
            builder.set(i - 1, i, off)?;
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_entries_are_zero() {
        let mut builder = SparseBuilder::new(3);
        builder.set(1, 2, 7.5).unwrap();
        assert_eq!(builder.get(1, 2), 7.5);
        assert_eq!(builder.get(2, 1), 0.0);
        assert_eq!(builder.nnz(), 1);

        let dense = builder.to_dense();
        assert_eq!(dense[(1, 2)], 7.5);
        assert_eq!(dense[(0, 0)], 0.0);
    }

    #[test]
    fn test_reassignment_overwrites_and_zero_removes() {
        let mut builder = SparseBuilder::new(2);
        builder.set(0, 0, 1.0).unwrap().set(0, 0, 3.0).unwrap();
        assert_eq!(builder.get(0, 0), 3.0);

        builder.set(0, 0, 0.0).unwrap();
        assert_eq!(builder.nnz(), 0);
        assert_eq!(builder.build().unwrap().triplet_iter().count(), 0);
    }

    #[test]
    fn test_out_of_range_assignment_is_rejected() {
        let mut builder = SparseBuilder::new(2);
        let err = builder.set(2, 0, 1.0).unwrap_err();
        assert!(err.is_dimension_mismatch());
        let err = builder.set(0, 5, 1.0).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_build_matches_assigned_entries() {
        let a = symmetric_tridiagonal(4, 4.0, -1.0).unwrap();
        let mut count = 0;
        for triplet in a.triplet_iter() {
            let expected = if triplet.row == triplet.col { 4.0 } else { -1.0 };
            assert!(triplet.row.abs_diff(triplet.col) <= 1);
            assert_eq!(*triplet.val, expected);
            count += 1;
        }
        assert_eq!(count, 10);
    }
}
