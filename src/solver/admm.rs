#![allow(non_snake_case)]

use crate::algebra::*;
use crate::io::ConfigurablePrintTarget;
use crate::solver::consensus::ConsensusCoordinator;
use crate::solver::linesearch::OscillationLineSearch;
use crate::solver::partition::{PartitionBuilder, PartitionState, PartitionSums};
use crate::solver::*;
use crate::timers::*;
use std::io::Write;

/// Consensus ADMM solver for the soft margin LP
///
/// ```text
/// minimize    -threshold + D Σⱼ ξⱼ
/// subject to  H[:,j]'a + ξⱼ >= threshold,  ξ >= 0,
///             Σa = 1,  a >= 0
/// ```
///
/// The data columns are split into `npar` partitions that each own a copy
/// of the shared block `[threshold; a]`.  Every partition factors its KKT
/// matrix once at construction, so repeated calls to
/// [`solve`](AdmmSolver::solve) only pay for back-substitutions.
///
/// ```no_run
/// use lpadmm::algebra::Matrix;
/// use lpadmm::solver::{AdmmSettingsBuilder, AdmmSolver};
///
/// let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
/// let settings = AdmmSettingsBuilder::default().tol(1e-6).build().unwrap();
/// let mut solver = AdmmSolver::new(&H, 0.5, settings).unwrap();
/// solver.solve().unwrap();
/// println!("a = {:?}", solver.solution.primal.a);
/// ```
pub struct AdmmSolver<T: FloatT> {
    pub(crate) data: ProblemData<T>,
    partitions: Vec<PartitionState<T>>,
    consensus: ConsensusCoordinator<T>,
    pub(crate) settings: AdmmSettings<T>,
    pub info: AdmmInfo<T>,
    pub solution: AdmmSolution<T>,
    timers: Option<Timers>,
}

impl<T> AdmmSolver<T>
where
    T: FloatT,
{
    /// Validate the inputs, partition the data and factor every
    /// partition's KKT matrix.
    pub fn new(H: &Matrix<T>, D: T, settings: AdmmSettings<T>) -> Result<Self, SolverError> {
        settings.validate()?;

        let mut timers = Timers::default();
        let setup;
        timeit! {timers => "setup"; {
            setup = ProblemData::new(H, D).and_then(|data| {
                let partitions = PartitionBuilder::new(&data, &settings).build()?;
                Ok((data, partitions))
            });
        }}
        let (data, partitions) = setup?;

        let mut info = AdmmInfo::new();
        info.partition_sizes = partitions.iter().map(|p| p.ni).collect();

        Ok(Self {
            consensus: ConsensusCoordinator::new(data.p),
            solution: AdmmSolution::new(data.p, data.n),
            data,
            partitions,
            settings,
            info,
            timers: Some(timers),
        })
    }

    pub fn settings(&self) -> &AdmmSettings<T> {
        &self.settings
    }

    /// Column indices of `H` assigned to each partition
    pub fn partition_columns(&self) -> Vec<&[usize]> {
        self.partitions.iter().map(|p| p.cols.as_slice()).collect()
    }

    /// Run the ADMM iteration from a zero start, followed by the line
    /// search and dual recovery when they apply.
    ///
    /// The primal solution is populated even if dual recovery fails.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        // timers is stored as an option so that we can swap it
        // out here and avoid borrow conflicts with other fields.
        let mut timers = self.timers.take().unwrap_or_default();

        // print errors never abort a solve
        notimeit! {timers; {
            let _ = self.info.print_banner(&self.settings);
            let _ = self.info.print_configuration(&self.settings, &self.data);
            let _ = self.info.print_status_header(&self.settings);
        }}

        self.info.reset(&mut timers);

        let result;
        timeit! {timers => "solve"; {
            result = self.run(&mut timers);
        }}

        self.info.finalize(&timers);

        notimeit! {timers; {
            let _ = self.info.print_footer(&self.settings, &self.solution, &timers);
        }}

        self.timers.replace(timers);
        result
    }

    fn run(&mut self, timers: &mut Timers) -> Result<(), SolverError> {
        let (p, n) = (self.data.p, self.data.n);
        let rho = self.settings.rho;

        self.partitions.iter_mut().for_each(|part| part.reset());
        self.consensus.reset();
        self.solution.dual = None;
        self.solution.linesearch_improvement = None;

        let npar = self.partitions.len();
        let mut history = History::new(p, npar, self.settings.max_iter as usize);
        let mut res = Residuals::default();
        let mut iter: u32 = 0;
        self.info.status = SolverStatus::Running;

        // ----------
        // main loop
        // ----------

        loop {
            iter += 1;

            let is_solve_success;
            timeit! {timers => "x-update"; {
                is_solve_success = update_x(&mut self.partitions, rho, self.settings.parallel);
            }}
            if !is_solve_success {
                return Err(self.numerical_failure(iter, history));
            }

            timeit! {timers => "consensus"; {
                let gl = self.consensus.update(&self.partitions);
                self.partitions.iter_mut().for_each(|part| part.update_zu(gl));
            }}

            let sums = self
                .partitions
                .iter()
                .map(|part| part.sums(rho))
                .fold(PartitionSums::default(), |acc, s| acc + s);
            res = Residuals::from_sums(&sums, n, p, rho, self.settings.tol, self.settings.reltol);
            if !res.is_finite() {
                return Err(self.numerical_failure(iter, history));
            }

            history.push(
                &res,
                self.consensus.value(),
                self.partitions.iter().map(|part| part.shared_x()),
            );
            self.info.update(&res, iter);

            notimeit! {timers; {
                let _ = self.info.print_status(&self.settings);
            }}

            if self.info.check_termination(&res, self.settings.max_iter) {
                break;
            }
        }

        let converged = self.info.status == SolverStatus::Converged;
        let fval_admm = res.objective;
        let mut point = self.consensus.value().to_vec();
        let mut obj_val = fval_admm;

        if !converged || self.settings.force_linesearch {
            let report;
            timeit! {timers => "line search"; {
                report = OscillationLineSearch::new(
                    &self.data,
                    self.settings.linesearch_deep_min_iter,
                    self.settings.linesearch_max_bisect,
                )
                .run(&history, fval_admm);
            }}
            if let (true, Some(refined), Some(obj)) =
                (report.adopted, &report.refined, report.objective)
            {
                point.copy_from(refined);
                obj_val = obj;
                self.solution.linesearch_improvement = Some(report.improvement);
            }
            self.info.linesearch = Some(report);
        }

        let sol = &mut self.solution;
        sol.primal.set_from(&self.data.H, &point);
        sol.obj_val = obj_val;
        sol.obj_val_admm = fval_admm;
        sol.iterations = iter;
        sol.status = self.info.status;
        sol.exitflag = exitflag(converged, &sol.primal.a, self.settings.tol);
        sol.history = history;

        if self.settings.recover_duals {
            let dual;
            timeit! {timers => "dual recovery"; {
                dual = recover_duals(
                    &self.data.H,
                    self.data.D,
                    &sol.primal,
                    obj_val,
                    &self.settings,
                );
            }}
            let dual = dual?;
            self.info.dual_residual = Some(dual.residual);
            sol.dual = Some(dual);
        }

        Ok(())
    }

    // leave info and solution in a terminal state before bailing out
    fn numerical_failure(&mut self, iter: u32, history: History<T>) -> SolverError {
        self.info.iterations = iter;
        self.info.status = SolverStatus::NumericalError;

        let sol = &mut self.solution;
        sol.obj_val = T::nan();
        sol.obj_val_admm = T::nan();
        sol.iterations = iter;
        sol.status = SolverStatus::NumericalError;
        sol.exitflag = 0;
        sol.history = history;

        SolverError::NonFiniteIterate { iteration: iter }
    }
}

// 1 on convergence, otherwise 0 or -1 when the weights are far off the simplex
fn exitflag<T: FloatT>(converged: bool, a: &[T], tol: T) -> i32 {
    let ten: T = (10.).as_T();
    if converged {
        1
    } else if simplex_infeasibility(a) > ten * tol {
        -1
    } else {
        0
    }
}

// x-update in every partition.  Returns false if any local solve failed.
fn update_x<T: FloatT>(partitions: &mut [PartitionState<T>], rho: T, parallel: bool) -> bool {
    cfg_if::cfg_if! {
        if #[cfg(feature = "parallel")] {
            if parallel && partitions.len() > 1 {
                use rayon::prelude::*;
                return partitions
                    .par_iter_mut()
                    .map(|part| part.update_x(rho))
                    .reduce(|| true, |a, b| a && b);
            }
        } else {
            let _ = parallel;
        }
    }
    partitions
        .iter_mut()
        .fold(true, |ok, part| part.update_x(rho) && ok)
}

impl<T> ConfigurablePrintTarget for AdmmSolver<T>
where
    T: FloatT,
{
    fn print_to_stdout(&mut self) {
        self.info.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.info.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.info.print_to_stream(stream)
    }
    fn print_to_sink(&mut self) {
        self.info.print_to_sink()
    }
    fn print_to_buffer(&mut self) {
        self.info.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.info.get_print_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exitflag() {
        assert_eq!(exitflag(true, &[0.2, 0.2], 1e-4), 1);
        assert_eq!(exitflag(false, &[0.5, 0.5], 1e-4), 0);
        assert_eq!(exitflag(false, &[0.5, 0.4], 1e-4), -1);
        assert_eq!(exitflag(false, &[1.0, -0.1, 0.1], 1e-1), 0);
    }

    #[test]
    fn test_serial_and_parallel_agree() {
        let H = Matrix::from(&[
            [0.9, 0.2, 0.7, 0.1, 0.5, 0.8, 0.3, 0.6, 0.4, 0.95],
            [0.1, 0.8, 0.4, 0.9, 0.6, 0.2, 0.7, 0.3, 0.5, 0.05],
        ]);
        let mk = |parallel| {
            AdmmSettingsBuilder::default()
                .npar(3)
                .max_iter(40)
                .parallel(parallel)
                .build()
                .unwrap()
        };
        let mut s1 = AdmmSolver::new(&H, 0.3, mk(false)).unwrap();
        let mut s2 = AdmmSolver::new(&H, 0.3, mk(true)).unwrap();
        s1.solve().unwrap();
        s2.solve().unwrap();
        assert_eq!(s1.solution.history.r_norm, s2.solution.history.r_norm);
        assert_eq!(s1.solution.primal, s2.solution.primal);
    }

    #[test]
    fn test_restart_is_repeatable() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let settings = AdmmSettingsBuilder::default().max_iter(30).build().unwrap();
        let mut solver = AdmmSolver::new(&H, 0.5, settings).unwrap();
        solver.solve().unwrap();
        let first = solver.solution.primal.clone();
        let iters = solver.solution.iterations;
        solver.solve().unwrap();
        assert_eq!(solver.solution.primal, first);
        assert_eq!(solver.solution.iterations, iters);
        assert_eq!(solver.solution.history.len(), iters as usize);
    }
}
