#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::SolverError;

/// Immutable problem data: the `p x n` matrix `H` whose columns are the
/// data points, and the box bound `D` on the dual variables.
#[derive(Debug, Clone)]
pub(crate) struct ProblemData<T> {
    pub H: Matrix<T>,
    pub D: T,
    pub p: usize,
    pub n: usize,
}

impl<T> ProblemData<T>
where
    T: FloatT,
{
    pub fn new(H: &Matrix<T>, D: T) -> Result<Self, SolverError> {
        if !(D.is_finite() && D > T::zero() && D <= T::one()) {
            return Err(SolverError::BadBoxBound(D.to_f64().unwrap_or(f64::NAN)));
        }
        let (p, n) = H.size();
        if p == 0 || n == 0 || H.data.len() != p * n {
            return Err(SolverError::BadDimensions { p, n, npar: 0 });
        }
        if !H.is_finite() {
            return Err(SolverError::NonFiniteData);
        }
        Ok(Self {
            H: H.clone(),
            D,
            p,
            n,
        })
    }

    /// Margins `H'a` of every data point
    pub fn margins(&self, a: &[T]) -> Vec<T> {
        let mut m = vec![T::zero(); self.n];
        self.H.gemv(&mut m, MatrixShape::T, a, T::one(), T::zero());
        m
    }

    pub fn true_objective(&self, threshold: T, a: &[T]) -> T {
        objective_from_margins(self.D, threshold, &self.margins(a))
    }
}

/// Objective of the soft margin LP at the point `(threshold, a)`,
///
/// ```text
/// -threshold + D * Σⱼ max(threshold - H[:,j]'a, 0)
/// ```
///
/// which is the exact (unrelaxed) objective that the ADMM iterate
/// approximates.
///
/// # Panics
/// Panics if `a` does not have one entry per row of `H`.
pub fn true_objective<T: FloatT>(H: &Matrix<T>, D: T, threshold: T, a: &[T]) -> T {
    assert_eq!(a.len(), H.nrows());
    let mut m = vec![T::zero(); H.ncols()];
    H.gemv(&mut m, MatrixShape::T, a, T::one(), T::zero());
    objective_from_margins(D, threshold, &m)
}

pub(crate) fn objective_from_margins<T: FloatT>(D: T, threshold: T, margins: &[T]) -> T {
    let hinge = margins
        .iter()
        .fold(T::zero(), |acc, &m| acc + (threshold - m).pos());
    -threshold + D * hinge
}
