//! This module provides thin, validated wrappers around the numerical routines the
//! diagnostic checks exercise.
//!
//! Each wrapper checks the shapes of its operands, calls exactly one [`faer`] entry
//! point (or, for the sparse eigenproblem, the Lanczos solver in
//! [`crate::algorithms`]) and turns every failure signal into a [`CheckError`].
//! `Ok` plays the role of a raised success flag: the payload is only produced when
//! the routine completed and its result is usable.

use crate::{
    algorithms::{LanczosOptions, SymmetricEigen, Which, lanczos::lanczos_eigs},
    error::{CheckError, CheckErrorKind},
};
use faer::{
    Side,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
    prelude::*,
    sparse::SparseColMat,
};
use std::collections::HashMap;

/// Relative tolerance used when checking that an input matrix is symmetric.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Computes `a * b^T`.
///
/// # Arguments
/// * `a`: An `m x k` matrix.
/// * `b`: An `n x k` matrix.
///
/// # Returns
/// The `m x n` product, or a dimension mismatch if the inner dimensions differ.
pub fn multiply_transpose(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> Result<Mat<f64>, CheckError> {
    if a.ncols() != b.ncols() {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "multiply by transpose (inner dimension)",
            expected: a.ncols(),
            actual: b.ncols(),
        }
        .into());
    }
    Ok(a * b.transpose())
}

/// Solves the sparse linear system `a x = b` with a sparse LU factorization.
///
/// # Arguments
/// * `a`: A square sparse matrix.
/// * `b`: The right-hand side, with as many rows as `a`.
///
/// # Returns
/// The solution `x`. A failed factorization, or a solution with non-finite entries,
/// is reported as a singular system.
pub fn sparse_solve(
    a: &SparseColMat<usize, f64>,
    b: MatRef<'_, f64>,
) -> Result<Mat<f64>, CheckError> {
    if a.nrows() != a.ncols() {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "sparse solve (square matrix)",
            expected: a.nrows(),
            actual: a.ncols(),
        }
        .into());
    }
    if b.nrows() != a.nrows() {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "sparse solve (right-hand side rows)",
            expected: a.nrows(),
            actual: b.nrows(),
        }
        .into());
    }

    let lu = a
        .as_ref()
        .sp_lu()
        .map_err(|e| CheckErrorKind::Singular(format!("sparse LU failed: {e:?}")))?;
    let x = lu.solve(b);

    if !is_finite(x.as_ref()) {
        return Err(CheckErrorKind::Singular(
            "the solution contains non-finite entries".to_string(),
        )
        .into());
    }
    Ok(x)
}

/// Computes the lower-triangular Cholesky factor `L` with `a = L L^T`.
///
/// # Arguments
/// * `a`: A square symmetric matrix.
///
/// # Returns
/// `L` with a zero strict upper triangle, or [`CheckError`] if `a` is not symmetric
/// positive-definite.
pub fn cholesky(a: MatRef<'_, f64>) -> Result<Mat<f64>, CheckError> {
    if a.nrows() != a.ncols() {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "Cholesky (square matrix)",
            expected: a.nrows(),
            actual: a.ncols(),
        }
        .into());
    }
    if !is_symmetric_dense(a) {
        return Err(CheckErrorKind::InputError(
            "the Cholesky factorization requires a symmetric matrix".to_string(),
        )
        .into());
    }

    let llt = a
        .llt(Side::Lower)
        .map_err(|e| CheckErrorKind::NotPositiveDefinite(format!("{e:?}")))?;

    // Only the lower triangle of the factor is meaningful.
    let l = llt.L();
    Ok(Mat::from_fn(a.nrows(), a.ncols(), |i, j| {
        if j <= i { l[(i, j)] } else { 0.0 }
    }))
}

/// Computes `nev` eigenpairs of the symmetric sparse matrix `a`.
///
/// # Arguments
/// * `a`: A square symmetric sparse matrix.
/// * `nev`: The number of eigenpairs, `0 < nev < n`.
/// * `which`: Which end of the spectrum to target.
/// * `options`: Tuning for the iterative solver.
///
/// # Returns
/// The converged eigenpairs, eigenvalues in ascending order.
pub fn sparse_eigs(
    a: &SparseColMat<usize, f64>,
    nev: usize,
    which: Which,
    options: &LanczosOptions,
) -> Result<SymmetricEigen, CheckError> {
    if a.nrows() != a.ncols() {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "sparse eigendecomposition (square matrix)",
            expected: a.nrows(),
            actual: a.ncols(),
        }
        .into());
    }
    if !is_symmetric_sparse(a) {
        return Err(CheckErrorKind::InputError(
            "the symmetric eigensolver requires a symmetric matrix".to_string(),
        )
        .into());
    }

    let operator = a.as_ref();
    let mut mem = MemBuffer::new(operator.apply_scratch(1, Par::Seq));
    let stack = MemStack::new(&mut mem);
    lanczos_eigs(&operator, nev, which, options, stack)
}

fn is_finite(x: MatRef<'_, f64>) -> bool {
    (0..x.ncols()).all(|j| (0..x.nrows()).all(|i| x[(i, j)].is_finite()))
}

fn is_symmetric_dense(a: MatRef<'_, f64>) -> bool {
    let n = a.nrows();
    (0..n).all(|i| {
        (0..i).all(|j| {
            let (x, y) = (a[(i, j)], a[(j, i)]);
            (x - y).abs() <= SYMMETRY_TOLERANCE * x.abs().max(y.abs()).max(1.0)
        })
    })
}

fn is_symmetric_sparse(a: &SparseColMat<usize, f64>) -> bool {
    let mut entries: HashMap<(usize, usize), f64> = HashMap::new();
    for triplet in a.triplet_iter() {
        *entries.entry((triplet.row, triplet.col)).or_insert(0.0) += *triplet.val;
    }
    entries.iter().all(|(&(row, col), &x)| {
        let y = entries.get(&(col, row)).copied().unwrap_or(0.0);
        (x - y).abs() <= SYMMETRY_TOLERANCE * x.abs().max(y.abs()).max(1.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{SparseBuilder, symmetric_tridiagonal};
    use faer::mat;

    #[test]
    fn test_multiply_transpose_shape_and_values() {
        let a: Mat<f64> = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let b: Mat<f64> = mat![[1.0, 0.0], [0.0, 1.0]];
        let c = multiply_transpose(a.as_ref(), b.as_ref()).unwrap();
        assert_eq!(c.nrows(), 3);
        assert_eq!(c.ncols(), 2);
        assert_eq!(c, a);
    }

    #[test]
    fn test_multiply_transpose_rejects_incompatible_shapes() {
        let a = Mat::<f64>::zeros(4, 5);
        let b = Mat::<f64>::zeros(4, 3);
        let err = multiply_transpose(a.as_ref(), b.as_ref()).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_sparse_solve_small_system() {
        let a = symmetric_tridiagonal(3, 2.0, -1.0).unwrap();
        let b: Mat<f64> = mat![[1.0], [0.0], [1.0]];
        let x = sparse_solve(&a, b.as_ref()).unwrap();
        for i in 0..3 {
            assert!((x[(i, 0)] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sparse_solve_rejects_wrong_rhs() {
        let a = symmetric_tridiagonal(3, 2.0, -1.0).unwrap();
        let b = Mat::<f64>::zeros(4, 1);
        let err = sparse_solve(&a, b.as_ref()).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_sparse_solve_singular_matrix_fails() {
        // The second row and column are empty, so the matrix is structurally singular.
        let mut builder = SparseBuilder::new(3);
        builder.set(0, 0, 1.0).unwrap();
        builder.set(2, 2, 1.0).unwrap();
        let a = builder.build().unwrap();
        let b: Mat<f64> = mat![[1.0], [1.0], [1.0]];
        assert!(sparse_solve(&a, b.as_ref()).is_err());
    }

    #[test]
    fn test_cholesky_identity() {
        let a = Mat::<f64>::identity(3, 3);
        let l = cholesky(a.as_ref()).unwrap();
        assert_eq!(l, a);
    }

    #[test]
    fn test_cholesky_indefinite_fails() {
        let a: Mat<f64> = mat![[1.0, 2.0], [2.0, 1.0]];
        let err = cholesky(a.as_ref()).unwrap_err();
        assert!(err.is_not_positive_definite());
    }

    #[test]
    fn test_cholesky_rejects_asymmetric() {
        let a: Mat<f64> = mat![[4.0, 1.0], [0.0, 4.0]];
        let err = cholesky(a.as_ref()).unwrap_err();
        assert!(err.to_string().contains("symmetric"));
    }

    #[test]
    fn test_sparse_eigs_rejects_asymmetric() {
        let mut builder = SparseBuilder::new(4);
        for i in 0..4 {
            builder.set(i, i, 1.0).unwrap();
        }
        builder.set(0, 3, 2.0).unwrap();
        let a = builder.build().unwrap();
        let err = sparse_eigs(&a, 1, Which::LargestMagnitude, &LanczosOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("symmetric"));
    }
}
