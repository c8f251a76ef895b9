//! This module defines the error type shared by the solver wrappers.
//!
//! Every numerical routine the diagnostic checks call reports failure through
//! a single public type, [`CheckError`]. A failed factorization, a singular
//! system or a non-convergent eigensolver all end up here, and the check
//! layer turns the error into a log line instead of aborting the run.
//!
//! As with the rest of the crate, [`thiserror`] provides the `Display`
//! implementations. [`faer::linalg::evd::EvdError`] does not implement
//! [`std::error::Error`], so it is wrapped manually.
use thiserror::Error;

/// Represents all numerical failures a solver wrapper can report.
///
/// The inner kind is private so that new failure modes can be added
/// without breaking callers that only display the error.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct CheckError(#[from] CheckErrorKind);

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum CheckErrorKind {
    /// The shapes of the operands are incompatible with the requested operation.
    #[error("Dimension mismatch in {context}: expected {expected}, found {actual}.")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An invalid input parameter was provided to a wrapper.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// The sparse direct solver could not produce a usable solution.
    #[error("The linear system is singular or numerically singular: {0}")]
    Singular(String),

    /// The Cholesky factorization hit a non-positive pivot.
    #[error("The matrix is not positive-definite: {0}")]
    NotPositiveDefinite(String),

    /// The Krylov subspace became invariant before enough eigenpairs were found.
    #[error(
        "Lanczos breakdown at step {k}: the Krylov subspace is invariant and holds only {available} of the {requested} requested eigenpairs."
    )]
    Breakdown {
        k: usize,
        available: usize,
        requested: usize,
    },

    /// The iterative eigensolver exhausted its step budget.
    #[error(
        "The eigensolver did not converge after {steps} steps: {converged} of {requested} eigenpairs converged."
    )]
    NoConvergence {
        steps: usize,
        converged: usize,
        requested: usize,
    },

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("A numerical error occurred during the eigendecomposition of T_k: {0:?}")]
    EvdError(faer::linalg::evd::EvdError),

    /// The sparse matrix could not be assembled from its entries.
    #[error("Failed to construct the sparse matrix: {0}")]
    SparseConstruction(String),
}

impl CheckError {
    /// Returns `true` if the failure means the matrix was not positive-definite.
    pub fn is_not_positive_definite(&self) -> bool {
        matches!(self.0, CheckErrorKind::NotPositiveDefinite(_))
    }

    /// Returns `true` if the failure is a shape incompatibility.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self.0, CheckErrorKind::DimensionMismatch { .. })
    }
}

// Manually implement PartialEq for the public error type.
impl PartialEq for CheckError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error_message() {
        let error = CheckError(CheckErrorKind::DimensionMismatch {
            context: "sparse solve",
            expected: 5,
            actual: 4,
        });
        assert_eq!(
            error.to_string(),
            "Dimension mismatch in sparse solve: expected 5, found 4."
        );
        assert!(error.is_dimension_mismatch());
    }

    #[test]
    fn test_not_positive_definite_message() {
        let error = CheckError(CheckErrorKind::NotPositiveDefinite(
            "non-positive pivot at index 1".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "The matrix is not positive-definite: non-positive pivot at index 1"
        );
        assert!(error.is_not_positive_definite());
    }

    #[test]
    fn test_breakdown_error_message() {
        let error = CheckError(CheckErrorKind::Breakdown {
            k: 3,
            available: 3,
            requested: 5,
        });
        let expected = "Lanczos breakdown at step 3: the Krylov subspace is invariant and holds only 3 of the 5 requested eigenpairs.";
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_no_convergence_error_message() {
        let error = CheckError(CheckErrorKind::NoConvergence {
            steps: 100,
            converged: 2,
            requested: 5,
        });
        let expected =
            "The eigensolver did not converge after 100 steps: 2 of 5 eigenpairs converged.";
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_evd_error_message() {
        let evd_error = faer::linalg::evd::EvdError::NoConvergence;
        let error = CheckError(CheckErrorKind::EvdError(evd_error));
        let expected_message =
            "A numerical error occurred during the eigendecomposition of T_k: NoConvergence";
        assert_eq!(error.to_string(), expected_message);
    }
}
