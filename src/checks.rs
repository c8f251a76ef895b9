//! The diagnostic check runner.
//!
//! A run is a fixed, ordered sequence of independent checks. Each check builds its own
//! small input, calls one routine from [`crate::solvers`], and appends a human-readable
//! account of the outcome to a caller-supplied sink:
//!
//! 1. [`Check::DenseMultiply`]: `A * B^T` for two random 4x5 matrices.
//! 2. [`Check::SparseSolve`]: sparse LU solve of a fixed 5x5 banded system.
//! 3. [`Check::Cholesky`]: Cholesky factor of a fixed 3x3 SPD matrix.
//! 4. [`Check::SparseEigen`]: a few eigenpairs of a 100x100 tridiagonal matrix.
//!
//! A numerical failure is absorbed by the check that hit it: it becomes a failure line
//! in the sink and a [`CheckOutcome::Failed`] in the returned report, and the next check
//! runs as usual. Only I/O errors from the sink itself are propagated.

use crate::{
    config::RunnerConfig,
    error::CheckError,
    matrix::{SparseBuilder, symmetric_tridiagonal},
    report::{format_column, format_matrix},
    solvers::{cholesky, multiply_transpose, sparse_eigs, sparse_solve},
};
use faer::{Mat, MatRef, mat, sparse::SparseColMat};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::io::{self, Write};

/// Dimension of the sparse linear system.
pub const SOLVE_DIM: usize = 5;
/// Dimension of the sparse eigenproblem.
pub const EIGEN_DIM: usize = 100;
/// Shape of the random matrices in the multiply check.
pub const MULTIPLY_SHAPE: (usize, usize) = (4, 5);

/// The individual checks, in the order a full run executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    /// Product of two random matrices with the transpose of the second.
    DenseMultiply,
    /// LU solve of a fixed 5x5 sparse system.
    SparseSolve,
    /// Lower Cholesky factor of a fixed 3x3 SPD matrix.
    Cholesky,
    /// A few eigenpairs of a 100x100 sparse tridiagonal matrix.
    SparseEigen,
}

impl Check {
    /// Every check, in execution order.
    pub const ALL: [Check; 4] = [
        Check::DenseMultiply,
        Check::SparseSolve,
        Check::Cholesky,
        Check::SparseEigen,
    ];

    /// Stable kebab-case identifier, used on the command line and in summaries.
    pub fn name(self) -> &'static str {
        match self {
            Check::DenseMultiply => "dense-multiply",
            Check::SparseSolve => "sparse-solve",
            Check::Cholesky => "cholesky",
            Check::SparseEigen => "sparse-eigen",
        }
    }

    /// The header line written at the start of the check.
    pub fn header(self) -> String {
        let title = match self {
            Check::DenseMultiply => "dense multiply",
            Check::SparseSolve => "sparse LU solve",
            Check::Cholesky => "Cholesky decomposition",
            Check::SparseEigen => "sparse eigendecomposition",
        };
        format!("Testing {title} =====================")
    }
}

/// How a single check ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The operation succeeded and its result was logged.
    Passed,
    /// The operation failed; the failure line and reason were logged.
    Failed {
        /// Display form of the underlying error.
        reason: String,
    },
}

impl CheckOutcome {
    /// Whether the check passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    /// The failure reason, or an empty string for a passed check.
    pub fn detail(&self) -> &str {
        match self {
            CheckOutcome::Passed => "",
            CheckOutcome::Failed { reason } => reason,
        }
    }
}

/// The outcome of one executed check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub check: Check,
    pub outcome: CheckOutcome,
}

/// Runs every check in order.
pub fn run_checks(sink: &mut dyn Write, config: &RunnerConfig) -> io::Result<Vec<CheckReport>> {
    run_selected(sink, config, &Check::ALL)
}

/// Runs the requested checks.
///
/// The checks always execute in [`Check::ALL`] order, and each at most once, no matter
/// how `selection` is ordered or whether it repeats entries.
pub fn run_selected(
    sink: &mut dyn Write,
    config: &RunnerConfig,
    selection: &[Check],
) -> io::Result<Vec<CheckReport>> {
    let mut reports = Vec::with_capacity(Check::ALL.len());
    for check in Check::ALL.into_iter().filter(|c| selection.contains(c)) {
        let outcome = run_check(check, sink, config)?;
        reports.push(CheckReport { check, outcome });
    }

    let failed = reports.iter().filter(|r| !r.outcome.is_passed()).count();
    log::info!(
        "Diagnostic run finished: {} passed, {} failed.",
        reports.len() - failed,
        failed
    );
    Ok(reports)
}

/// Runs one check and reports its outcome.
pub fn run_check(
    check: Check,
    sink: &mut dyn Write,
    config: &RunnerConfig,
) -> io::Result<CheckOutcome> {
    log::info!("Running check `{}`...", check.name());
    let outcome = match check {
        Check::DenseMultiply => dense_multiply_check(sink, config)?,
        Check::SparseSolve => sparse_solve_check(sink, config)?,
        Check::Cholesky => cholesky_check_with(spd_matrix().as_ref(), sink, config)?,
        Check::SparseEigen => sparse_eigen_check(sink, config)?,
    };
    if let CheckOutcome::Failed { reason } = &outcome {
        log::warn!("Check `{}` failed: {reason}", check.name());
    }
    Ok(outcome)
}

/// The fixed coefficient matrix and right-hand side of the sparse solve check.
///
/// The band is assigned in full, zeros included. Zero assignments store nothing.
pub fn sparse_solve_system() -> Result<(SparseBuilder, Mat<f64>), CheckError> {
    const A: [[f64; SOLVE_DIM]; SOLVE_DIM] = [
        [4.0, -1.0, 0.0, 0.0, 0.0],
        [-1.0, 4.0, -1.0, 0.0, 0.0],
        [0.0, -1.0, 4.0, -1.0, 0.0],
        [0.0, 0.0, -1.0, 4.0, -1.0],
        [0.0, 0.0, 0.0, -1.0, 4.0],
    ];
    let mut builder = SparseBuilder::new(SOLVE_DIM);
    for (i, row) in A.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            builder.set(i, j, value)?;
        }
    }
    let b = Mat::from_fn(SOLVE_DIM, 1, |i, _| (i + 1) as f64);
    Ok((builder, b))
}

/// The fixed symmetric positive-definite matrix of the Cholesky check.
pub fn spd_matrix() -> Mat<f64> {
    mat![
        [4.0, 12.0, -16.0],
        [12.0, 37.0, -43.0],
        [-16.0, -43.0, 98.0],
    ]
}

/// The fixed tridiagonal matrix of the sparse eigen check.
pub fn eigen_matrix() -> Result<SparseColMat<usize, f64>, CheckError> {
    symmetric_tridiagonal(EIGEN_DIM, 4.0, -1.0)
}

fn dense_multiply_check(sink: &mut dyn Write, config: &RunnerConfig) -> io::Result<CheckOutcome> {
    writeln!(sink, "{}", Check::DenseMultiply.header())?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (rows, cols) = MULTIPLY_SHAPE;
    let a = Mat::from_fn(rows, cols, |_, _| rng.random::<f64>());
    let b = Mat::from_fn(rows, cols, |_, _| rng.random::<f64>());

    writeln!(sink, "Matrix A:")?;
    write!(sink, "{}", format_matrix(a.as_ref()))?;
    writeln!(sink, "Matrix B:")?;
    write!(sink, "{}", format_matrix(b.as_ref()))?;

    match multiply_transpose(a.as_ref(), b.as_ref()) {
        Ok(product) => {
            writeln!(sink, "A * transpose(B):")?;
            write!(sink, "{}", format_matrix(product.as_ref()))?;
            Ok(CheckOutcome::Passed)
        }
        Err(e) => report_failure(sink, "Failed to multiply the matrices.", &e.to_string()),
    }
}

fn sparse_solve_check(sink: &mut dyn Write, config: &RunnerConfig) -> io::Result<CheckOutcome> {
    writeln!(sink, "{}", Check::SparseSolve.header())?;

    const FAILURE: &str = "Failed to solve the sparse linear system.";
    let solved = sparse_solve_system().and_then(|(builder, b)| {
        let a = builder.build()?;
        let x = sparse_solve(&a, b.as_ref())?;
        Ok((builder.to_dense(), b, x))
    });
    let (a_dense, b, x) = match solved {
        Ok(parts) => parts,
        Err(e) => return report_failure(sink, FAILURE, &e.to_string()),
    };

    let ax = &a_dense * &x;
    let residual = max_abs_diff(ax.as_ref(), b.as_ref());
    log::debug!("Sparse solve residual ||Ax - b||_inf = {residual:.3e}");
    if residual > config.tolerance {
        let reason = format!(
            "residual {residual:.3e} exceeds tolerance {:.3e}",
            config.tolerance
        );
        return report_failure(sink, FAILURE, &reason);
    }

    writeln!(sink, "Solution x:")?;
    write!(sink, "{}", format_matrix(x.as_ref()))?;
    Ok(CheckOutcome::Passed)
}

/// Runs the Cholesky check on `a` instead of the built-in SPD matrix.
///
/// A matrix that is not symmetric positive-definite produces a failure line and a
/// [`CheckOutcome::Failed`], never a panic.
pub fn cholesky_check_with(
    a: MatRef<'_, f64>,
    sink: &mut dyn Write,
    config: &RunnerConfig,
) -> io::Result<CheckOutcome> {
    writeln!(sink, "{}", Check::Cholesky.header())?;

    const FAILURE: &str =
        "Cholesky decomposition failed. The matrix might not be positive-definite.";
    let l = match cholesky(a) {
        Ok(l) => l,
        Err(e) => return report_failure(sink, FAILURE, &e.to_string()),
    };

    let reconstructed = &l * l.transpose();
    let error = max_abs_diff(reconstructed.as_ref(), a);
    let scale = max_abs(a).max(1.0);
    log::debug!("Cholesky reconstruction error ||LL^T - A||_max = {error:.3e}");
    if error > config.tolerance * scale {
        let reason = format!("reconstruction error {error:.3e} exceeds tolerance");
        return report_failure(sink, FAILURE, &reason);
    }

    writeln!(sink, "Matrix L:")?;
    write!(sink, "{}", format_matrix(l.as_ref()))?;
    Ok(CheckOutcome::Passed)
}

fn sparse_eigen_check(sink: &mut dyn Write, config: &RunnerConfig) -> io::Result<CheckOutcome> {
    writeln!(sink, "{}", Check::SparseEigen.header())?;

    let result =
        eigen_matrix().and_then(|a| sparse_eigs(&a, config.nev, config.which, &config.eigen));
    match result {
        Ok(eig) => {
            log::info!(
                "Eigensolver converged after {} steps ({} eigenpairs).",
                eig.steps_taken,
                eig.eigenvalues.len()
            );
            writeln!(sink, "Eigenvalues:")?;
            write!(sink, "{}", format_column(&eig.eigenvalues))?;
            writeln!(sink, "Eigenvectors:")?;
            write!(sink, "{}", format_matrix(eig.eigenvectors.as_ref()))?;
            Ok(CheckOutcome::Passed)
        }
        Err(e) => report_failure(
            sink,
            "Failed to compute eigenvalues and eigenvectors.",
            &e.to_string(),
        ),
    }
}

fn report_failure(sink: &mut dyn Write, message: &str, reason: &str) -> io::Result<CheckOutcome> {
    writeln!(sink, "{message}")?;
    writeln!(sink, "Reason: {reason}")?;
    Ok(CheckOutcome::Failed {
        reason: reason.to_string(),
    })
}

fn max_abs(m: MatRef<'_, f64>) -> f64 {
    (0..m.ncols())
        .flat_map(|j| (0..m.nrows()).map(move |i| m[(i, j)].abs()))
        .fold(0.0, f64::max)
}

/// Largest entrywise difference between two matrices of the same shape.
fn max_abs_diff(x: MatRef<'_, f64>, y: MatRef<'_, f64>) -> f64 {
    let mut max = 0.0_f64;
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            max = max.max((x[(i, j)] - y[(i, j)]).abs());
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(config: &RunnerConfig, selection: &[Check]) -> (String, Vec<CheckReport>) {
        let mut buffer = Vec::new();
        let reports = run_selected(&mut buffer, config, selection).unwrap();
        (String::from_utf8(buffer).unwrap(), reports)
    }

    #[test]
    fn test_sparse_solve_fixture_stores_only_the_band() {
        let (builder, b) = sparse_solve_system().unwrap();
        assert_eq!(builder.nnz(), 13);
        assert_eq!(b[(4, 0)], 5.0);
    }

    #[test]
    fn test_selection_runs_in_fixed_order_once() {
        let config = RunnerConfig::seeded(7);
        let (_, reports) = run_to_string(
            &config,
            &[Check::Cholesky, Check::SparseSolve, Check::Cholesky],
        );
        let order: Vec<Check> = reports.iter().map(|r| r.check).collect();
        assert_eq!(order, vec![Check::SparseSolve, Check::Cholesky]);
    }

    #[test]
    fn test_cholesky_check_logs_factor() {
        let mut buffer = Vec::new();
        let outcome =
            cholesky_check_with(spd_matrix().as_ref(), &mut buffer, &RunnerConfig::default())
                .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(outcome.is_passed());
        assert!(text.contains("Matrix L:"));
        assert!(text.contains("    -8.0000     5.0000     3.0000"));
        assert!(!text.contains("failed"));
    }

    #[test]
    fn test_cholesky_failure_is_reported_not_raised() {
        let indefinite: Mat<f64> = mat![[1.0, 2.0], [2.0, 1.0]];
        let mut buffer = Vec::new();
        let outcome =
            cholesky_check_with(indefinite.as_ref(), &mut buffer, &RunnerConfig::default())
                .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(!outcome.is_passed());
        assert!(text.contains(
            "Cholesky decomposition failed. The matrix might not be positive-definite."
        ));
        assert!(!text.contains("Matrix L:"));
    }

    #[test]
    fn test_sparse_solve_passes_with_default_tolerance() {
        let (text, reports) = run_to_string(&RunnerConfig::default(), &[Check::SparseSolve]);
        assert_eq!(reports[0].outcome, CheckOutcome::Passed);
        assert!(text.contains("Solution x:"));
        assert!(!text.contains("Failed to solve the sparse linear system."));
    }

    #[test]
    fn test_sparse_solve_residual_over_tolerance_is_reported() {
        // No residual is below a negative tolerance, so the verification step must fail.
        let config = RunnerConfig {
            tolerance: -1.0,
            ..RunnerConfig::default()
        };
        let (text, reports) = run_to_string(&config, &[Check::SparseSolve]);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].check, Check::SparseSolve);
        assert!(!reports[0].outcome.is_passed());
        assert!(reports[0].outcome.detail().contains("exceeds tolerance"));
        assert!(text.starts_with(&Check::SparseSolve.header()));
        assert!(text.contains("Failed to solve the sparse linear system.\n"));
        assert!(text.contains("Reason: residual "));
        assert!(!text.contains("Solution x:"));
    }

    #[test]
    fn test_sparse_solve_failure_does_not_stop_later_checks() {
        let config = RunnerConfig {
            tolerance: -1.0,
            ..RunnerConfig::seeded(5)
        };
        let (text, reports) = run_to_string(&config, &Check::ALL);
        assert_eq!(reports.len(), Check::ALL.len());
        assert!(!reports[1].outcome.is_passed());
        assert!(reports[0].outcome.is_passed());
        assert!(text.contains(&Check::SparseEigen.header()));
        assert!(text.contains("Eigenvalues:"));
    }

    #[test]
    fn test_eigen_failure_is_reported() {
        let config = RunnerConfig {
            nev: EIGEN_DIM,
            ..RunnerConfig::default()
        };
        let (text, reports) = run_to_string(&config, &[Check::SparseEigen]);
        assert!(!reports[0].outcome.is_passed());
        assert!(text.contains("Failed to compute eigenvalues and eigenvectors."));
        assert!(!text.contains("Eigenvalues:"));
    }

    #[test]
    fn test_seeded_multiply_is_reproducible() {
        let config = RunnerConfig::seeded(123);
        let (first, _) = run_to_string(&config, &[Check::DenseMultiply]);
        let (second, _) = run_to_string(&config, &[Check::DenseMultiply]);
        assert_eq!(first, second);
        assert!(first.contains("A * transpose(B):"));
    }
}
