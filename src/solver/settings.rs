use crate::algebra::*;
use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadField(&'static str),
}

/// Settings for the [`AdmmSolver`](crate::solver::AdmmSolver).
///
/// Build with [`AdmmSettingsBuilder`], which fills in the defaults below
/// and validates on `build()`:
///
/// ```no_run
/// use lpadmm::solver::AdmmSettingsBuilder;
///
/// let settings = AdmmSettingsBuilder::<f64>::default()
///     .npar(4)
///     .tol(1e-6)
///     .verbose(true)
///     .build()
///     .unwrap();
/// ```

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdmmSettings<T: FloatT> {
    ///ADMM penalty parameter ρ
    #[builder(default = "(1.0).as_T()")]
    pub rho: T,

    ///restart threshold η.  Validated but not used by the unaccelerated iteration
    #[builder(default = "(0.999).as_T()")]
    pub eta: T,

    ///maximum number of iterations
    #[builder(default = "1000")]
    pub max_iter: u32,

    ///absolute tolerance
    #[builder(default = "(1e-4).as_T()")]
    pub tol: T,

    ///relative tolerance
    #[builder(default = "(1e-2).as_T()")]
    pub reltol: T,

    ///number of partitions of the data columns
    #[builder(default = "1")]
    pub npar: usize,

    ///seed for the column permutation that assigns partitions
    #[builder(default = "0")]
    pub partition_seed: u64,

    ///run the line search even when the iteration converges
    #[builder(default = "false")]
    pub force_linesearch: bool,

    ///recover the dual variables after solving
    #[builder(default = "false")]
    pub recover_duals: bool,

    ///verbose printing
    #[builder(default = "false")]
    pub verbose: bool,

    ///solve the partition subproblems on the rayon thread pool
    #[builder(default = "true")]
    pub parallel: bool,

    ///KKT static regularization parameter
    #[builder(default = "(1e-8).as_T()")]
    pub kkt_static_reg: T,

    ///iterative refinement maximum iterations
    #[builder(default = "10")]
    pub kkt_refine_max_iter: u32,

    ///iterative refinement relative tolerance
    #[builder(default = "(1e-13).as_T()")]
    pub kkt_refine_reltol: T,

    ///iterative refinement absolute tolerance
    #[builder(default = "(1e-12).as_T()")]
    pub kkt_refine_abstol: T,

    ///minimum iteration count for the oscillation (deep history) line search
    #[builder(default = "400")]
    pub linesearch_deep_min_iter: u32,

    ///maximum bisection steps in each line search stage
    #[builder(default = "60")]
    pub linesearch_max_bisect: u32,

    ///relative margin slack below which a point counts as on the margin
    ///during dual recovery
    #[builder(default = "(1e-3).as_T()")]
    pub dual_margin_tol: T,

    ///fail dual recovery with an error when its KKT residual exceeds
    ///`dual_recovery_tol`.  Otherwise the residual is only reported
    #[builder(default = "false")]
    pub dual_check_residual: bool,

    ///largest KKT residual accepted from dual recovery when checked
    #[builder(default = "(1e-3).as_T()")]
    pub dual_recovery_tol: T,
}

impl<T> Default for AdmmSettings<T>
where
    T: FloatT,
{
    fn default() -> AdmmSettings<T> {
        AdmmSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> AdmmSettings<T>
where
    T: FloatT,
{
    /// Checks that numerical values lie in their admissible ranges
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_rho(self.rho)?;
        validate_eta(self.eta)?;
        validate_nonneg(self.tol, "tol")?;
        validate_nonneg(self.reltol, "reltol")?;
        validate_nonneg(self.kkt_static_reg, "kkt_static_reg")?;
        validate_nonneg(self.dual_margin_tol, "dual_margin_tol")?;
        validate_nonneg(self.dual_recovery_tol, "dual_recovery_tol")?;
        if self.npar == 0 {
            return Err(SettingsError::BadField("npar"));
        }
        if self.max_iter == 0 {
            return Err(SettingsError::BadField("max_iter"));
        }
        Ok(())
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for AdmmSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        AdmmSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> AdmmSettingsBuilder<T>
where
    T: FloatT,
{
    /// check the fields that have been set explicitly
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(rho) = self.rho {
            validate_rho(rho)?;
        }
        if let Some(eta) = self.eta {
            validate_eta(eta)?;
        }
        if let Some(tol) = self.tol {
            validate_nonneg(tol, "tol")?;
        }
        if let Some(reltol) = self.reltol {
            validate_nonneg(reltol, "reltol")?;
        }
        if let Some(reg) = self.kkt_static_reg {
            validate_nonneg(reg, "kkt_static_reg")?;
        }
        if self.npar == Some(0) {
            return Err(SettingsError::BadField("npar"));
        }
        if self.max_iter == Some(0) {
            return Err(SettingsError::BadField("max_iter"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_rho<T: FloatT>(rho: T) -> Result<(), SettingsError> {
    if rho.is_finite() && rho > T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadField("rho"))
    }
}

fn validate_eta<T: FloatT>(eta: T) -> Result<(), SettingsError> {
    if eta >= (0.25).as_T() && eta < T::one() {
        Ok(())
    } else {
        Err(SettingsError::BadField("eta"))
    }
}

fn validate_nonneg<T: FloatT>(v: T, name: &'static str) -> Result<(), SettingsError> {
    if v >= T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadField(name))
    }
}
