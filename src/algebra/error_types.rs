use thiserror::Error;

/// Error type returned by dense factorization routines.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DenseFactorizationError {
    /// Normal equations not positive definite even after regularization
    #[error("Cholesky factorization failed: matrix is not positive definite")]
    NotPositiveDefinite,
}

/// Error type returned by the (bounded) least squares solvers.
#[derive(Error, Debug, PartialEq)]
pub enum LeastSquaresError {
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    #[error("Subproblem factorization failed: {0}")]
    Factorization(#[from] DenseFactorizationError),
    #[error("Lower bounds must be finite and no greater than upper bounds")]
    BadBounds,
    #[error("Active set iteration limit ({0}) reached")]
    MaxIterations(usize),
}

/// Error type returned by sparse matrix assembly operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SparseFormatError {
    /// Matrix dimension fields and/or array lengths are incompatible
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    /// Row value exceeds the matrix row dimension, or rows are unsorted
    #[error("Bad row index values")]
    BadRowval,
    /// Matrix column pointer values are defective
    #[error("Bad column pointer values")]
    BadColptr,
}
