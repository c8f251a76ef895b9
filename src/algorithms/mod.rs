//! Iterative eigensolvers for symmetric sparse operators.
//!
//! The only algorithm currently provided is the symmetric Lanczos process with
//! full reorthogonalisation ([`lanczos::lanczos_eigs`]). It builds an
//! orthonormal basis V_k of the Krylov subspace K_k(A, v_0) together with the
//! tridiagonal projection T_k = V_k^T A V_k, and extracts Ritz pairs from T_k
//! until the requested number of them has converged.
//!
//! Callers should normally go through [`crate::solvers::sparse_eigs`], which
//! validates the input matrix and allocates the workspace.

pub mod lanczos;

use crate::error::{CheckError, CheckErrorKind};
use faer::{Mat, Side};

/// Which end of the spectrum the eigensolver should target.
///
/// The variants follow the usual ARPACK selectors. The default,
/// [`Which::LargestMagnitude`], matches what `eigs`-style routines return
/// when no selector is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Which {
    /// Eigenvalues with the largest absolute value (`lm`).
    #[default]
    LargestMagnitude,
    /// Eigenvalues with the smallest absolute value (`sm`).
    SmallestMagnitude,
    /// Algebraically largest eigenvalues (`la`).
    LargestAlgebraic,
    /// Algebraically smallest eigenvalues (`sa`).
    SmallestAlgebraic,
}

impl Which {
    /// Returns the indices of the `count` Ritz values preferred by this selector.
    pub(crate) fn select(self, thetas: &[f64], count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..thetas.len()).collect();
        order.sort_by(|&i, &j| {
            let (a, b) = (thetas[i], thetas[j]);
            match self {
                Which::LargestMagnitude => b.abs().total_cmp(&a.abs()),
                Which::SmallestMagnitude => a.abs().total_cmp(&b.abs()),
                Which::LargestAlgebraic => b.total_cmp(&a),
                Which::SmallestAlgebraic => a.total_cmp(&b),
            }
        });
        order.truncate(count);
        order
    }
}

/// Tuning knobs for the Lanczos eigensolver.
#[derive(Debug, Clone, PartialEq)]
pub struct LanczosOptions {
    /// Upper bound on the Krylov subspace dimension. `None` means the operator dimension.
    ///
    /// The solver does not restart, so a bound below the dimension can fail to converge
    /// on clustered spectra.
    pub max_steps: Option<usize>,
    /// Relative residual tolerance a Ritz pair must reach to count as converged.
    pub tol: f64,
    /// How many Lanczos steps to take between two convergence tests.
    pub check_interval: usize,
    /// Seed for the random starting vector.
    pub start_seed: u64,
}

impl Default for LanczosOptions {
    fn default() -> Self {
        Self {
            max_steps: None,
            tol: 1e-10,
            check_interval: 5,
            start_seed: 42,
        }
    }
}

/// The eigenpairs returned by a successful run.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Converged eigenvalues, sorted in ascending order.
    pub eigenvalues: Vec<f64>,
    /// Unit-norm eigenvectors. Column `j` belongs to `eigenvalues[j]`.
    pub eigenvectors: Mat<f64>,
    /// The number of Lanczos steps performed.
    pub steps_taken: usize,
}

/// Threshold below which a `beta` coefficient is treated as zero.
#[inline]
pub(crate) fn breakdown_tolerance() -> f64 {
    f64::EPSILON.sqrt()
}

/// Assembles the dense `k x k` symmetric tridiagonal matrix T_k.
///
/// ```text
/// T_k = | α_1 β_1  0  ... |
///       | β_1 α_2 β_2 ... |
///       |  0  β_2 α_3 ... |
///       | ... ... ... ... |
/// ```
pub(crate) fn assemble_tridiagonal(alphas: &[f64], betas: &[f64]) -> Mat<f64> {
    let steps = alphas.len();
    let mut t_k = Mat::zeros(steps, steps);
    for (i, &alpha) in alphas.iter().enumerate() {
        t_k[(i, i)] = alpha;
    }
    for (i, &beta) in betas.iter().enumerate().take(steps.saturating_sub(1)) {
        t_k[(i, i + 1)] = beta;
        t_k[(i + 1, i)] = beta;
    }
    t_k
}

/// Ritz values and vectors of T_k, in the order `faer` returns them (ascending).
pub(crate) struct RitzPairs {
    pub thetas: Vec<f64>,
    pub vectors: Mat<f64>,
}

/// Diagonalises T_k.
pub(crate) fn ritz_pairs(alphas: &[f64], betas: &[f64]) -> Result<RitzPairs, CheckError> {
    let t_k = assemble_tridiagonal(alphas, betas);
    let steps = t_k.nrows();
    let evd = t_k
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(CheckErrorKind::EvdError)?;

    let s = evd.S();
    let thetas = (0..steps).map(|i| s[i]).collect();
    Ok(RitzPairs {
        thetas,
        vectors: evd.U().to_owned(),
    })
}
