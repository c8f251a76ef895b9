//! Symmetric Lanczos eigensolver with full reorthogonalisation.
//!
//! ** NOTE: We recommend using the high-level method [`crate::solvers::sparse_eigs`] instead.
//! This module is intended for callers that already hold a [`faer::matrix_free::LinOp`]
//! and a workspace.
//!
//! The iteration stores every basis vector, so memory grows as O(nk). In exchange each
//! new vector is orthogonalised against the whole basis (two passes of modified
//! Gram-Schmidt), which keeps the Ritz values free of the spurious copies plain Lanczos
//! produces once orthogonality is lost. Every `check_interval` steps the tridiagonal
//! projection T_k is diagonalised and the residual estimate |β_k · u_{k,j}| of each
//! wanted Ritz pair is tested.
//!
//! There is no restarting. On a clustered spectrum, such as that of a large symmetric
//! Toeplitz tridiagonal, the wanted pairs may only reach the default tolerance once the
//! basis spans the whole space. A `max_steps` below the operator dimension then ends in
//! a no-convergence error rather than in a less accurate result.

use super::{LanczosOptions, SymmetricEigen, Which, breakdown_tolerance, ritz_pairs};
use crate::error::{CheckError, CheckErrorKind};
use faer::{Mat, MatRef, Par, dyn_stack::MemStack, matrix_free::LinOp};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Computes `nev` eigenpairs of the symmetric operator `operator`.
///
/// # Arguments
/// * `operator`: A symmetric linear operator implementing [`faer::matrix_free::LinOp`].
/// * `nev`: The number of eigenpairs to return. Must satisfy `0 < nev < n`.
/// * `which`: Which end of the spectrum to target.
/// * `options`: Step budget, tolerance and start vector seed.
/// * `stack`: A [`MemStack`] sized for one application of `operator` to a single column.
///
/// # Returns
/// The converged eigenpairs sorted by ascending eigenvalue, or a [`CheckError`] if the
/// Krylov subspace became invariant too early or the step budget ran out.
pub fn lanczos_eigs(
    operator: &impl LinOp<f64>,
    nev: usize,
    which: Which,
    options: &LanczosOptions,
    stack: &mut MemStack,
) -> Result<SymmetricEigen, CheckError> {
    let n = operator.nrows();
    if operator.ncols() != n {
        return Err(CheckErrorKind::DimensionMismatch {
            context: "eigensolver operator (columns)",
            expected: n,
            actual: operator.ncols(),
        }
        .into());
    }
    if nev == 0 || nev >= n {
        return Err(CheckErrorKind::InputError(format!(
            "the number of eigenpairs must satisfy 0 < nev < n (nev = {nev}, n = {n})"
        ))
        .into());
    }
    if options.check_interval == 0 {
        return Err(CheckErrorKind::InputError(
            "the convergence check interval must be positive".to_string(),
        )
        .into());
    }

    let max_steps = options.max_steps.unwrap_or(n).clamp(nev, n);

    // The whole basis is kept; column j holds v_j.
    let mut v_k = Mat::<f64>::zeros(n, max_steps);
    let mut w = Mat::<f64>::zeros(n, 1);
    let mut alphas = Vec::with_capacity(max_steps);
    let mut betas = Vec::with_capacity(max_steps);

    let start = random_unit_vector(n, options.start_seed);
    v_k.col_mut(0).copy_from(start.col(0));

    for j in 0..max_steps {
        // w = A v_j
        operator.apply(w.as_mut(), v_k.as_ref().get(.., j..j + 1), Par::Seq, stack);

        let alpha = column_dot(v_k.as_ref(), j, w.as_ref());
        alphas.push(alpha);

        // Two passes of modified Gram-Schmidt against v_0..v_j. This removes the
        // α_j v_j and β_{j-1} v_{j-1} terms of the three-term recurrence as well.
        for _ in 0..2 {
            for i in 0..=j {
                let h = column_dot(v_k.as_ref(), i, w.as_ref());
                for r in 0..n {
                    w[(r, 0)] -= h * v_k[(r, i)];
                }
            }
        }

        let beta = w.norm_l2();
        betas.push(beta);
        let steps = j + 1;
        let breakdown = beta <= breakdown_tolerance();
        let last = steps == max_steps;

        if breakdown || last || steps % options.check_interval == 0 {
            if steps >= nev {
                let pairs = ritz_pairs(&alphas, &betas)?;
                let selected = which.select(&pairs.thetas, nev);
                let converged = selected
                    .iter()
                    .filter(|&&c| {
                        let theta = pairs.thetas[c];
                        let residual = if breakdown {
                            0.0
                        } else {
                            (beta * pairs.vectors[(steps - 1, c)]).abs()
                        };
                        residual <= options.tol * theta.abs().max(1.0)
                    })
                    .count();

                log::debug!(
                    "Lanczos step {steps}: beta = {beta:.3e}, {converged}/{nev} Ritz pairs converged"
                );

                if converged == nev {
                    return Ok(assemble_eigenpairs(
                        v_k.as_ref().get(.., 0..steps),
                        &pairs.thetas,
                        pairs.vectors.as_ref(),
                        selected,
                        steps,
                    ));
                }
                if last {
                    return Err(CheckErrorKind::NoConvergence {
                        steps,
                        converged,
                        requested: nev,
                    }
                    .into());
                }
            }

            if breakdown {
                return Err(CheckErrorKind::Breakdown {
                    k: steps,
                    available: steps,
                    requested: nev,
                }
                .into());
            }
        }

        // v_{j+1} = w / β_j
        if !last {
            let inv_beta = beta.recip();
            for r in 0..n {
                v_k[(r, j + 1)] = w[(r, 0)] * inv_beta;
            }
        }
    }

    // The loop always returns on its last step.
    Err(CheckErrorKind::NoConvergence {
        steps: max_steps,
        converged: 0,
        requested: nev,
    }
    .into())
}

/// Forms the Ritz vectors V_k U_sel and orders the pairs by ascending eigenvalue.
fn assemble_eigenpairs(
    basis: MatRef<'_, f64>,
    thetas: &[f64],
    ritz_vectors: MatRef<'_, f64>,
    mut selected: Vec<usize>,
    steps: usize,
) -> SymmetricEigen {
    selected.sort_by(|&a, &b| thetas[a].total_cmp(&thetas[b]));

    let u_sel = Mat::from_fn(steps, selected.len(), |i, c| ritz_vectors[(i, selected[c])]);
    let eigenvectors = basis * &u_sel;
    let eigenvalues = selected.iter().map(|&c| thetas[c]).collect();

    SymmetricEigen {
        eigenvalues,
        eigenvectors,
        steps_taken: steps,
    }
}

/// Returns `v_k[:, col] . w[:, 0]`.
fn column_dot(v_k: MatRef<'_, f64>, col: usize, w: MatRef<'_, f64>) -> f64 {
    (0..v_k.nrows()).map(|r| v_k[(r, col)] * w[(r, 0)]).sum()
}

/// Draws a reproducible random vector of unit 2-norm.
///
/// A random start gives a nonzero component along every eigenvector with probability
/// one. Structured starts such as the all-ones vector are orthogonal to half the
/// eigenvectors of a symmetric Toeplitz matrix and cause an early breakdown.
fn random_unit_vector(n: usize, seed: u64) -> Mat<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let v = Mat::from_fn(n, 1, |_, _| rng.random::<f64>() - 0.5);
    let norm = v.norm_l2();
    Mat::from_fn(n, 1, |i, _| v[(i, 0)] / norm)
}
