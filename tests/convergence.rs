#![allow(non_snake_case)]

use lpadmm::{algebra::*, solver::*};

fn two_feature_data() -> Matrix<f64> {
    Matrix::from(&[
        [0.9, 0.2, 0.7, 0.1, 0.5, 0.8, 0.3, 0.6, 0.4, 0.95],
        [0.1, 0.8, 0.4, 0.9, 0.6, 0.2, 0.7, 0.3, 0.5, 0.05],
    ])
}

fn reference_objective(H: &Matrix<f64>, D: f64) -> f64 {
    let steps = 4000;
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

fn solve_two_partitions(D: f64, seed: u64) -> AdmmSolver<f64> {
    let H = two_feature_data();
    let settings = AdmmSettingsBuilder::default()
        .npar(2)
        .max_iter(500)
        .tol(1e-4)
        .reltol(1e-2)
        .partition_seed(seed)
        .build()
        .unwrap();
    let mut solver = AdmmSolver::new(&H, D, settings).unwrap();
    solver.solve().unwrap();
    solver
}

#[test]
fn test_reference_objectives() {
    let H = two_feature_data();
    assert!((reference_objective(&H, 0.2) + 0.48).abs() < 1e-9);
    assert!((reference_objective(&H, 0.3) + 0.47).abs() < 1e-9);
}

#[test]
fn test_two_partitions_converge() {
    let H = two_feature_data();

    for &D in [0.2, 0.3].iter() {
        let refobj = reference_objective(&H, D);

        for seed in 0..4 {
            let solver = solve_two_partitions(D, seed);
            let sol = &solver.solution;

            assert_eq!(sol.exitflag, 1, "D = {D}, seed = {seed}");
            assert!(sol.iterations < 500);
            assert_eq!(solver.info.partition_sizes.iter().sum::<usize>(), 10);

            // loose tolerances, so compare against the optimum loosely
            assert!((sol.primal.a.sum() - 1.0).abs() <= 1e-3);
            assert!((sol.obj_val - refobj).abs() <= 2e-2);
            let exact = true_objective(&H, D, sol.primal.threshold, &sol.primal.a);
            assert!(exact - refobj >= -1e-3);
            assert!(exact - refobj <= 2e-2);
        }
    }
}

#[test]
fn test_residuals_decrease_to_thresholds() {
    let solver = solve_two_partitions(0.2, 0);
    let h = &solver.solution.history;
    let k = h.len();

    assert!(k > 1);
    assert!(h.r_norm.iter().all(|r| r.is_finite() && *r >= 0.0));
    assert!(h.s_norm.iter().all(|s| s.is_finite() && *s >= 0.0));

    // the stopping test holds at the end and not at the first iteration
    assert!(h.r_norm[k - 1] < h.eps_pri[k - 1]);
    assert!(h.s_norm[k - 1] < h.eps_dual[k - 1]);
    assert!(!(h.r_norm[0] < h.eps_pri[0] && h.s_norm[0] < h.eps_dual[0]));

    assert_eq!(solver.info.r_norm, h.r_norm[k - 1]);
    assert_eq!(solver.info.objective, solver.solution.obj_val_admm);
}

#[test]
fn test_consensus_weights_nonnegative() {
    let solver = solve_two_partitions(0.3, 1);
    let h = &solver.solution.history;
    for k in 0..h.len() {
        let gl = h.consensus(k);
        assert_eq!(gl.len(), 3);
        assert!(gl[1..].iter().all(|&a| a >= 0.0));
    }
}

#[test]
fn test_nonfinite_iterate_leaves_terminal_status() {
    // ρ² overflows, so the dual residual of the first iteration is not finite
    let H = two_feature_data();
    let settings = AdmmSettingsBuilder::default()
        .rho(1e300)
        .max_iter(50)
        .build()
        .unwrap();
    let mut solver = AdmmSolver::new(&H, 0.2, settings).unwrap();

    let result = solver.solve();
    assert!(matches!(
        result,
        Err(SolverError::NonFiniteIterate { iteration: 1 })
    ));

    let sol = &solver.solution;
    assert_eq!(solver.info.status, SolverStatus::NumericalError);
    assert_eq!(sol.status, SolverStatus::NumericalError);
    assert_eq!(sol.iterations, 1);
    assert_eq!(solver.info.iterations, 1);
    assert_eq!(sol.exitflag, 0);
    assert!(sol.obj_val.is_nan());
    assert!(sol.history.is_empty());
    assert!(sol.dual.is_none());
}
