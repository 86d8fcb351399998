#![allow(non_snake_case)]

use lpadmm::{algebra::*, solver::*};

fn basic_lp_data() -> (Matrix<f64>, f64) {
    let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
    (H, 0.5)
}

fn basic_lp_settings(npar: usize, max_iter: u32) -> AdmmSettings<f64> {
    AdmmSettingsBuilder::default()
        .rho(1.0)
        .eta(0.999)
        .max_iter(max_iter)
        .tol(1e-6)
        .reltol(1e-4)
        .npar(npar)
        .build()
        .unwrap()
}

// Optimal value of the LP for p = 2, by exhaustive evaluation over the
// simplex.  For fixed weights the objective is piecewise linear in the
// threshold, so its minimum sits at one of the margins.
fn reference_objective(H: &Matrix<f64>, D: f64) -> f64 {
    let steps = 20000;
    let mut best = f64::INFINITY;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let a = [t, 1.0 - t];
        let mut margins = vec![0.0; H.ncols()];
        H.gemv(&mut margins, MatrixShape::T, &a, 1.0, 0.0);
        for &thr in margins.iter() {
            best = best.min(true_objective(H, D, thr, &a));
        }
    }
    best
}

#[test]
fn test_reference_objective() {
    let (H, D) = basic_lp_data();
    assert!((reference_objective(&H, D) + 2.0).abs() < 1e-12);
}

#[test]
fn test_lp_converges_single_partition() {
    let (H, D) = basic_lp_data();
    let mut solver = AdmmSolver::new(&H, D, basic_lp_settings(1, 200)).unwrap();
    solver.solve().unwrap();

    let sol = &solver.solution;
    assert_eq!(sol.exitflag, 1);
    assert_eq!(sol.status, SolverStatus::Converged);
    assert!(sol.iterations < 200);

    // weights on the simplex, none above 1/2
    let a = &sol.primal.a;
    assert!((a.sum() - 1.0).abs() <= 1e-3);
    assert!(a.iter().all(|&ai| ai >= 0.0 && ai <= 0.5 + 1e-3));

    let refobj = reference_objective(&H, D);
    assert!((sol.obj_val - refobj).abs() <= 1e-3);
    assert_eq!(sol.obj_val_admm, sol.obj_val);
    assert!((sol.primal.threshold - 2.0).abs() <= 1e-3);

    // slacks are consistent with the returned point
    let exact = true_objective(&H, D, sol.primal.threshold, a);
    assert!((exact - refobj).abs() <= 1e-3);
    assert!(sol.primal.xi.iter().all(|&x| x >= 0.0 && x <= 1e-3));
}

#[test]
fn test_lp_converges_one_point_per_partition() {
    let (H, D) = basic_lp_data();
    let mut solver = AdmmSolver::new(&H, D, basic_lp_settings(3, 500)).unwrap();
    solver.solve().unwrap();

    let sol = &solver.solution;
    assert_eq!(sol.exitflag, 1);
    assert_eq!(solver.info.partition_sizes, vec![1, 1, 1]);
    assert!((sol.obj_val - reference_objective(&H, D)).abs() <= 1e-3);
    assert!((sol.primal.a.sum() - 1.0).abs() <= 1e-3);
}

#[test]
fn test_lp_history_is_truncated() {
    let (H, D) = basic_lp_data();
    let mut solver = AdmmSolver::new(&H, D, basic_lp_settings(1, 200)).unwrap();
    solver.solve().unwrap();

    let sol = &solver.solution;
    let k = sol.iterations as usize;
    assert_eq!(sol.history.len(), k);
    assert_eq!(sol.history.s_norm.len(), k);
    assert_eq!(sol.history.consensus_len(), 3);

    // the last snapshot is the returned point
    let last = sol.history.consensus(k - 1);
    assert_eq!(last[0], sol.primal.threshold);
    assert_eq!(&last[1..], sol.primal.a.as_slice());

    // converged on the final iteration only
    assert!(sol.history.r_norm[k - 1] < sol.history.eps_pri[k - 1]);
    assert!(sol.history.s_norm[k - 1] < sol.history.eps_dual[k - 1]);
    assert_eq!(solver.info.iterations, sol.iterations);
    assert!(solver.info.linesearch.is_none());
}

#[test]
fn test_lp_history_keeps_partition_blocks() {
    let (H, D) = basic_lp_data();
    let mut solver = AdmmSolver::new(&H, D, basic_lp_settings(3, 500)).unwrap();
    solver.solve().unwrap();

    let h = &solver.solution.history;
    let k = h.len();
    assert_eq!(h.npar(), 3);

    // every local copy of [threshold; a] is within r_norm of the consensus
    for it in [0, k / 2, k - 1] {
        for i in 0..3 {
            let local = h.local(it, i);
            assert_eq!(local.len(), h.consensus_len());
            assert!(local.norm_inf_diff(h.consensus(it)) <= h.r_norm[it] + 1e-12);
        }
    }
}
