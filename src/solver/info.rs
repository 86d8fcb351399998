use crate::algebra::*;
use crate::io::PrintTarget;
use crate::solver::{LinesearchReport, Residuals};
use crate::timers::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of the ADMM iteration

#[repr(u32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStatus {
    /// Solver hasn't run.
    Unsolved,
    /// Iteration in progress.
    Running,
    /// Primal and dual residuals fell below their thresholds.
    Converged,
    /// Iteration limit reached before convergence.
    MaxIterations,
    /// Iteration stopped on a NaN or Inf iterate.
    NumericalError,
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Default for SolverStatus {
    fn default() -> Self {
        SolverStatus::Unsolved
    }
}

/// Progress and summary information for an ADMM solve
#[derive(Default, Debug)]
pub struct AdmmInfo<T> {
    pub iterations: u32,
    pub status: SolverStatus,
    /// relaxed objective of the latest iteration
    pub objective: T,
    pub r_norm: T,
    pub s_norm: T,
    pub eps_pri: T,
    pub eps_dual: T,
    /// columns assigned to each partition
    pub partition_sizes: Vec<usize>,
    pub linesearch: Option<LinesearchReport<T>>,
    /// KKT residual of recovered duals
    pub dual_residual: Option<T>,
    pub setup_time: f64,
    pub solve_time: f64,

    pub(crate) stream: PrintTarget,
}

impl<T> AdmmInfo<T>
where
    T: FloatT,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self, timers: &mut Timers) {
        self.status = SolverStatus::Unsolved;
        self.iterations = 0;
        self.objective = T::nan();
        self.r_norm = T::nan();
        self.s_norm = T::nan();
        self.eps_pri = T::nan();
        self.eps_dual = T::nan();
        self.linesearch = None;
        self.dual_residual = None;
        self.solve_time = 0f64;

        timers.reset_timer("solve");
    }

    pub(crate) fn update(&mut self, res: &Residuals<T>, iter: u32) {
        self.iterations = iter;
        self.objective = res.objective;
        self.r_norm = res.r_norm;
        self.s_norm = res.s_norm;
        self.eps_pri = res.eps_pri;
        self.eps_dual = res.eps_dual;
    }

    pub(crate) fn check_termination(&mut self, res: &Residuals<T>, max_iter: u32) -> bool {
        if res.is_converged() {
            self.status = SolverStatus::Converged;
        } else if self.iterations >= max_iter {
            self.status = SolverStatus::MaxIterations;
        }
        self.status != SolverStatus::Running
    }

    pub(crate) fn finalize(&mut self, timers: &Timers) {
        self.setup_time = timers.get_time("setup").as_secs_f64();
        self.solve_time = timers.get_time("solve").as_secs_f64();
    }
}
