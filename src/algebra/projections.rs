use crate::algebra::{AsFloatT, FloatT, ScalarMath, VectorMath};
use std::cmp::Ordering;

/// Euclidean projection onto the unit simplex `{x : x >= 0, sum(x) = 1}`,
/// in place.
///
/// Sort-based method: find the largest `k` such that the `k` largest entries
/// stay positive after a common shift, then shift and clip.
pub fn project_simplex<T: FloatT>(v: &mut [T]) {
    if v.is_empty() {
        return;
    }
    let mut u = v.to_vec();
    u.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumsum = T::zero();
    let mut theta = T::zero();
    for (k, &uk) in u.iter().enumerate() {
        cumsum += uk;
        let t = (cumsum - T::one()) / (k + 1).as_T();
        if uk - t > T::zero() {
            theta = t;
        }
    }
    v.scalarop(|x| (x - theta).pos());
}

/// Distance of `a` from the unit simplex as `|1 - sum(a)| + sum(max(-a, 0))`.
pub fn simplex_infeasibility<T: FloatT>(a: &[T]) -> T {
    let neg = a.iter().fold(T::zero(), |acc, &x| acc + (-x).pos());
    T::abs(T::one() - a.sum()) + neg
}
