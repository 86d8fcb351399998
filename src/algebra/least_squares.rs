#![allow(non_snake_case)]

use crate::algebra::*;
use faer::linalg::solvers::{Llt, Solve};
use faer::Side;
use std::iter::zip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundState {
    Lower,
    Upper,
    Free,
}

/// Bounded-variable least squares.
///
/// Solves `min ||Ax - b||` subject to `lb <= x <= ub` with an active set
/// iteration in the style of Lawson and Hanson.  Every variable starts at
/// its lower bound, so `lb` must be finite.  Upper bounds may be infinite.
///
/// Each subproblem on the free variables is solved through its normal
/// equations with a dense `faer` Cholesky factorization in double precision.
pub fn bvls<T: FloatT>(
    A: &Matrix<T>,
    b: &[T],
    lb: &[T],
    ub: &[T],
) -> Result<Vec<T>, LeastSquaresError> {
    let (m, n) = A.size();
    if b.len() != m || lb.len() != n || ub.len() != n {
        return Err(LeastSquaresError::IncompatibleDimension);
    }
    if zip(lb, ub).any(|(&l, &u)| !l.is_finite() || l > u) {
        return Err(LeastSquaresError::BadBounds);
    }

    let mut x = lb.to_vec();
    let mut state = vec![BoundState::Lower; n];
    let mut blocked = vec![false; n];
    let mut r = vec![T::zero(); m];
    let mut w = vec![T::zero(); n];

    let max_iter = 3 * n + 30;
    let mut iter = 0;

    let tol = {
        A.gemv(&mut w, MatrixShape::T, b, T::one(), T::zero());
        let scale: T = (1e-10).as_T();
        scale * (T::one() + w.norm_inf())
    };

    loop {
        // w = A'(b - Ax) is the negative gradient
        r.copy_from(b);
        A.gemv(&mut r, MatrixShape::N, &x, -T::one(), T::one());
        A.gemv(&mut w, MatrixShape::T, &r, T::one(), T::zero());

        let mut entering = None;
        let mut best = tol;
        for j in 0..n {
            let gain = match state[j] {
                BoundState::Lower => w[j],
                BoundState::Upper => -w[j],
                BoundState::Free => continue,
            };
            if !blocked[j] && gain > best {
                best = gain;
                entering = Some((j, state[j]));
            }
        }

        let Some((j, from)) = entering else {
            return Ok(x);
        };
        state[j] = BoundState::Free;
        let mut first_pass = true;

        loop {
            iter += 1;
            if iter > max_iter {
                return Err(LeastSquaresError::MaxIterations(max_iter));
            }

            let free: Vec<usize> = (0..n).filter(|&k| state[k] == BoundState::Free).collect();
            let z = solve_free_subproblem(A, b, &x, &free)?;

            // a variable that would move back through its bound can't enter
            if first_pass {
                first_pass = false;
                let pos = free.iter().position(|&k| k == j).unwrap_or(0);
                let wrong_way = match from {
                    BoundState::Lower => z[pos] <= x[j],
                    _ => z[pos] >= x[j],
                };
                if wrong_way {
                    state[j] = from;
                    blocked[j] = true;
                    break;
                }
            }

            let feasible = zip(&free, &z).all(|(&k, &zk)| zk > lb[k] && zk < ub[k]);
            if feasible {
                zip(&free, &z).for_each(|(&k, &zk)| x[k] = zk);
                blocked.fill(false);
                break;
            }

            // step toward z as far as the bounds allow
            let mut alpha = T::one();
            let mut hit = free[0];
            for (&k, &zk) in zip(&free, &z) {
                let ratio = if zk <= lb[k] {
                    (x[k] - lb[k]) / (x[k] - zk)
                } else if zk >= ub[k] {
                    (ub[k] - x[k]) / (zk - x[k])
                } else {
                    continue;
                };
                if ratio < alpha {
                    alpha = ratio;
                    hit = k;
                }
            }
            let alpha = alpha.clip(T::zero(), T::one());

            for (&k, &zk) in zip(&free, &z) {
                let xk = x[k];
                x[k] = xk + alpha * (zk - xk);
                let ten: T = (10.).as_T();
                let atol = T::epsilon() * ten * (T::one() + T::abs(lb[k]));
                if k == hit || x[k] <= lb[k] + atol || x[k] >= ub[k] - atol {
                    if zk <= lb[k] || x[k] <= lb[k] + atol {
                        x[k] = lb[k];
                        state[k] = BoundState::Lower;
                    } else {
                        x[k] = ub[k];
                        state[k] = BoundState::Upper;
                    }
                }
            }

            if state.iter().all(|&s| s != BoundState::Free) {
                blocked.fill(false);
                break;
            }
        }
    }
}

// Least squares over the columns in `free` with every other variable
// held at its current value in `x`.
fn solve_free_subproblem<T: FloatT>(
    A: &Matrix<T>,
    b: &[T],
    x: &[T],
    free: &[usize],
) -> Result<Vec<T>, LeastSquaresError> {
    let mut rhs = b.to_vec();
    for (k, &xk) in x.iter().enumerate() {
        if xk != T::zero() && !free.contains(&k) {
            rhs.axpby(-xk, A.col_slice(k), T::one());
        }
    }

    let Af = A.select_columns(free);
    let nf = free.len();
    let mut G = faer::Mat::<f64>::from_fn(nf, nf, |i, j| {
        as_f64(Af.col_slice(i).dot(Af.col_slice(j)))
    });
    let mut g = vec![T::zero(); nf];
    Af.gemv(&mut g, MatrixShape::T, &rhs, T::one(), T::zero());
    let mut g = faer::Mat::<f64>::from_fn(nf, 1, |i, _| as_f64(g[i]));

    let chol = match Llt::new(G.as_ref(), Side::Lower) {
        Ok(chol) => chol,
        Err(_) => {
            // rank deficient free columns: retry with a small ridge
            let scale = (0..nf).fold(0.0f64, |acc, i| acc.max(G[(i, i)].abs()));
            let ridge = 1e-12 * (1.0 + scale);
            (0..nf).for_each(|i| G[(i, i)] += ridge);
            Llt::new(G.as_ref(), Side::Lower)
                .map_err(|_| DenseFactorizationError::NotPositiveDefinite)?
        }
    };
    chol.solve_in_place(g.as_mut());
    Ok((0..nf).map(|i| AsFloatT::<T>::as_T(&g[(i, 0)])).collect())
}

fn as_f64<T: FloatT>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
