//! Diagnostic smoke checks for dense and sparse linear-algebra routines.
//!
//! This crate runs a short, fixed sequence of checks against the numerical routines an
//! application depends on, and renders what happened as plain text. Each check builds a
//! small input, makes one call into the linear-algebra stack, and writes either the
//! result or a failure line into a shared log:
//!
//! 1. **Dense multiply**: `A * B^T` for two random 4x5 matrices.
//! 2. **Sparse solve**: a 5x5 banded system `A x = [1, 2, 3, 4, 5]^T` via sparse LU.
//! 3. **Cholesky**: the lower factor of `[[4, 12, -16], [12, 37, -43], [-16, -43, 98]]`.
//! 4. **Sparse eigen**: five eigenpairs of the 100x100 tridiagonal matrix
//!    `tridiag(-1, 4, -1)` via an iterative Lanczos eigensolver.
//!
//! Dense and sparse storage, LU and Cholesky factorizations, and the dense symmetric
//! eigendecomposition of the Lanczos projection all come from [`faer`].
//!
//! ## Example Usage
//!
//! ```rust
//! use linalg_smoke::{Check, RunnerConfig, run_checks};
//!
//! let mut log = Vec::new();
//! let reports = run_checks(&mut log, &RunnerConfig::seeded(42)).unwrap();
//!
//! assert_eq!(reports.len(), Check::ALL.len());
//! assert!(reports.iter().all(|r| r.outcome.is_passed()));
//!
//! let text = String::from_utf8(log).unwrap();
//! assert!(text.contains("Matrix L:"));
//! ```
//!
//! ## Failure handling
//!
//! The routines in [`solvers`] return `Result<_, CheckError>`. The runner in [`checks`]
//! folds every such error into a failure line and a [`CheckOutcome::Failed`], so one
//! failing routine never prevents the remaining checks from running.

pub mod algorithms;
pub mod checks;
pub mod config;
pub mod error;
pub mod matrix;
pub mod report;
pub mod solvers;

// Re-export the main API for convenient access.
pub use algorithms::{LanczosOptions, SymmetricEigen, Which};
pub use checks::{
    Check, CheckOutcome, CheckReport, cholesky_check_with, run_check, run_checks, run_selected,
};
pub use config::RunnerConfig;
pub use error::CheckError;
