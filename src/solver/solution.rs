#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::{History, SolverStatus};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Primal solution of the soft margin LP
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimalSolution<T> {
    /// weights on the rows of `H`, on the unit simplex
    pub a: Vec<T>,
    /// margin threshold
    pub threshold: T,
    /// slacks `ξ = max(threshold - H'a, 0)`, one per data point
    pub xi: Vec<T>,
}

impl<T> PrimalSolution<T>
where
    T: FloatT,
{
    pub(crate) fn new(p: usize, n: usize) -> Self {
        Self {
            a: vec![T::zero(); p],
            threshold: T::zero(),
            xi: vec![T::zero(); n],
        }
    }

    // fill from a consensus vector `[threshold; a]`
    pub(crate) fn set_from(&mut self, H: &Matrix<T>, consensus: &[T]) {
        self.threshold = consensus[0];
        self.a.copy_from(&consensus[1..]);
        H.gemv(&mut self.xi, MatrixShape::T, &self.a, T::one(), T::zero());
        let thr = self.threshold;
        self.xi.scalarop(|m| (thr - m).pos());
    }
}

/// Dual solution recovered from the KKT conditions
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DualSolution<T> {
    /// box constrained multipliers, `0 <= u <= D`
    pub u: Vec<T>,
    /// dual objective, the negated primal objective
    pub beta: T,
    /// largest KKT residual of the recovered system
    pub residual: T,
}

/// Solution returned by [`AdmmSolver`](crate::solver::AdmmSolver)
#[derive(Debug, Clone)]
pub struct AdmmSolution<T> {
    pub primal: PrimalSolution<T>,
    /// populated only when dual recovery is requested
    pub dual: Option<DualSolution<T>>,
    /// final objective, after any adopted line search
    pub obj_val: T,
    /// relaxed ADMM objective of the last iteration
    pub obj_val_admm: T,
    /// 1 converged, 0 iteration limit, -1 iteration limit with an
    /// infeasible weight vector
    pub exitflag: i32,
    pub iterations: u32,
    pub status: SolverStatus,
    /// objective decrease from an adopted line search
    pub linesearch_improvement: Option<T>,
    pub history: History<T>,
}

impl<T> AdmmSolution<T>
where
    T: FloatT,
{
    pub(crate) fn new(p: usize, n: usize) -> Self {
        Self {
            primal: PrimalSolution::new(p, n),
            dual: None,
            obj_val: T::nan(),
            obj_val_admm: T::nan(),
            exitflag: 0,
            iterations: 0,
            status: SolverStatus::Unsolved,
            linesearch_improvement: None,
            history: History::new(p, 0, 0),
        }
    }

    /// Dual objective `β`, when duals were recovered
    pub fn beta(&self) -> Option<T> {
        self.dual.as_ref().map(|d| d.beta)
    }
}
