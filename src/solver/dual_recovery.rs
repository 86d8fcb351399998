#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::{AdmmSettings, DualRecoveryError, DualSolution, PrimalSolution};
use std::cmp::Ordering;

// entries above this count as violating (ξ) or in the support (a)
const ACTIVE_TOL: f64 = 1e-5;

/// Recover the box constrained multipliers `u` of the soft margin LP from
/// a primal solution.
///
/// Points with positive slack `ξ` sit at the upper bound `u = D`.  The
/// remaining multipliers are solved for on the points closest to the
/// margin so that `H[r,:]u = β` on every supported weight `r` and
/// `Σu = 1`, with `β = -fval`.
///
/// The infinity norm residual of those equations is returned with the
/// multipliers.  It is only treated as an error when
/// `settings.dual_check_residual` is set.
pub fn recover_duals<T: FloatT>(
    H: &Matrix<T>,
    D: T,
    primal: &PrimalSolution<T>,
    fval: T,
    settings: &AdmmSettings<T>,
) -> Result<DualSolution<T>, DualRecoveryError> {
    let (p, n) = H.size();
    if primal.a.len() != p || primal.xi.len() != n {
        return Err(DualRecoveryError::IncompatibleDimension);
    }

    let tol: T = ACTIVE_TOL.as_T();
    let beta = -fval;
    let thr = primal.threshold;

    let mut margins = vec![T::zero(); n];
    H.gemv(&mut margins, MatrixShape::T, &primal.a, T::one(), T::zero());

    let (viol, nonviol): (Vec<usize>, Vec<usize>) = (0..n).partition(|&j| primal.xi[j] > tol);
    let support: Vec<usize> = (0..p).filter(|&r| primal.a[r] > tol).collect();

    // free multipliers needed to make up Σu = 1
    let nviol: T = viol.len().as_T();
    let required = ((T::one() - D * nviol) / D - (1e-9).as_T()).ceil();
    let required = required.to_usize().unwrap_or(0);
    if required > support.len() {
        return Err(DualRecoveryError::OverDetermined {
            required,
            available: support.len(),
        });
    }

    let free = select_free(&margins, thr, nonviol, required, settings.dual_margin_tol);

    // rows: supported weights, then the normalization
    let nrows = support.len() + 1;
    let mut M = Matrix::zeros((nrows, free.len()));
    for (c, &j) in free.iter().enumerate() {
        for (r, &i) in support.iter().enumerate() {
            M[(r, c)] = H[(i, j)];
        }
        M[(nrows - 1, c)] = T::one();
    }

    let mut rhs = vec![T::zero(); nrows];
    for (r, &i) in support.iter().enumerate() {
        let fixed = viol.iter().fold(T::zero(), |acc, &j| acc + H[(i, j)]);
        rhs[r] = beta - D * fixed;
    }
    rhs[nrows - 1] = T::one() - D * nviol;

    let lb = vec![T::zero(); free.len()];
    let ub = vec![D; free.len()];
    let ufree = bvls(&M, &rhs, &lb, &ub)?;

    let mut resid = rhs.clone();
    M.gemv(&mut resid, MatrixShape::N, &ufree, T::one(), -T::one());
    let residual = resid.norm_inf();
    if settings.dual_check_residual && !(residual <= settings.dual_recovery_tol) {
        return Err(DualRecoveryError::Inconsistent {
            residual: residual.to_f64().unwrap_or(f64::NAN),
        });
    }

    let mut u = vec![T::zero(); n];
    for &j in viol.iter() {
        u[j] = D;
    }
    for (&j, &v) in free.iter().zip(ufree.iter()) {
        u[j] = v;
    }

    Ok(DualSolution { u, beta, residual })
}

// Non-violating points on the margin, ordered by slack.  Falls back to the
// `required` smallest slacks when too few are within tolerance.
fn select_free<T: FloatT>(
    margins: &[T],
    thr: T,
    mut nonviol: Vec<usize>,
    required: usize,
    margin_tol: T,
) -> Vec<usize> {
    let slack = |j: usize| margins[j] - thr;
    nonviol.sort_by(|&i, &j| slack(i).partial_cmp(&slack(j)).unwrap_or(Ordering::Equal));

    let cutoff = margin_tol * T::max(T::one(), thr.abs());
    let ntight = nonviol.iter().take_while(|&&j| slack(j) <= cutoff).count();
    nonviol.truncate(usize::max(ntight, required));
    nonviol
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primal_for(H: &Matrix<f64>, threshold: f64, a: &[f64]) -> PrimalSolution<f64> {
        let mut margins = vec![0.0; H.ncols()];
        H.gemv(&mut margins, MatrixShape::T, a, 1.0, 0.0);
        PrimalSolution {
            a: a.to_vec(),
            threshold,
            xi: margins.iter().map(|&m| (threshold - m).max(0.0)).collect(),
        }
    }

    #[test]
    fn test_recover_duals_exact() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let D = 0.5;
        let primal = primal_for(&H, 2.0, &[0.5, 0.5]);
        let settings = AdmmSettings::default();
        let dual = recover_duals(&H, D, &primal, -2.0, &settings).unwrap();

        assert_eq!(dual.beta, 2.0);
        assert!(dual.u.iter().all(|&u| (0.0..=D).contains(&u)));
        assert!((dual.u.sum() - 1.0).abs() < 1e-8);

        let mut Hu = vec![0.0; 2];
        H.gemv(&mut Hu, MatrixShape::N, &dual.u, 1.0, 0.0);
        assert!(Hu.iter().all(|&v| (v - 2.0).abs() < 1e-6));
        assert!(dual.residual < 1e-6);
    }

    #[test]
    fn test_recover_duals_over_determined() {
        let H = Matrix::from(&[
            [0.9, 0.2, 0.7, 0.1, 0.5, 0.8, 0.3, 0.6, 0.4, 0.95],
            [0.1, 0.8, 0.4, 0.9, 0.6, 0.2, 0.7, 0.3, 0.5, 0.05],
        ]);
        // two points below the margin, so three free multipliers are
        // needed against two supported weights
        let primal = primal_for(&H, 0.5, &[0.5, 0.5]);
        let result = recover_duals(&H, 0.2, &primal, -0.49, &AdmmSettings::default());
        assert_eq!(
            result.unwrap_err(),
            DualRecoveryError::OverDetermined {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_recover_duals_bad_dimension() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let mut primal = primal_for(&H, 2.0, &[0.5, 0.5]);
        primal.xi.pop();
        let result = recover_duals(&H, 0.5, &primal, -2.0, &AdmmSettings::default());
        assert_eq!(result.unwrap_err(), DualRecoveryError::IncompatibleDimension);
    }

    #[test]
    fn test_select_free() {
        let margins = [2.0, 2.5, 2.0005, 3.0];
        // tight points first, sorted by slack
        assert_eq!(select_free(&margins, 2.0, vec![0, 1, 2, 3], 1, 1e-3), vec![0, 2]);
        // padded out to the required count
        assert_eq!(select_free(&margins, 2.0, vec![0, 1, 2, 3], 3, 1e-3), vec![0, 2, 1]);
    }
}
