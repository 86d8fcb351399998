use crate::algebra::LeastSquaresError;
use crate::qdldl::QDLDLError;
use crate::solver::SettingsError;
use thiserror::Error;

/// Error type returned by [`AdmmSolver`](crate::solver::AdmmSolver)
/// construction and solves.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The box bound `D` must be finite and lie in (0, 1]
    #[error("Box bound D = {0} must lie in (0, 1]")]
    BadBoxBound(f64),
    /// Settings failed validation
    #[error("Invalid settings: {0}")]
    BadSettings(#[from] SettingsError),
    /// Data matrix is empty or has fewer columns than partitions
    #[error("Incompatible dimensions: H is {p} x {n} with {npar} partitions")]
    BadDimensions { p: usize, n: usize, npar: usize },
    /// Data matrix contains NaN or Inf
    #[error("Data matrix contains non-finite values")]
    NonFiniteData,
    /// A partition KKT matrix could not be factored
    #[error("KKT factorization failed in partition {partition}: {source}")]
    Factorization {
        partition: usize,
        #[source]
        source: QDLDLError,
    },
    /// The iteration produced NaN or Inf
    #[error("Iterate became non-finite at iteration {iteration}")]
    NonFiniteIterate { iteration: u32 },
    /// Requested dual recovery failed
    #[error("Dual recovery failed: {0}")]
    DualRecovery(#[from] DualRecoveryError),
}

/// Error type returned by dual recovery
#[derive(Error, Debug, PartialEq)]
pub enum DualRecoveryError {
    /// More free dual variables are needed than the weight support provides
    #[error("Over-determined KKT system: {required} free duals required, {available} available")]
    OverDetermined { required: usize, available: usize },
    /// The recovered duals leave a KKT residual above `dual_recovery_tol`,
    /// reported only when `dual_check_residual` is set
    #[error("Recovered duals are inconsistent (residual {residual:e})")]
    Inconsistent { residual: f64 },
    /// Primal point has the wrong length for the data
    #[error("Primal point is incompatible with the data dimensions")]
    IncompatibleDimension,
    /// The bounded least squares solve failed
    #[error("Least squares solve failed: {0}")]
    LeastSquares(#[from] LeastSquaresError),
}
