#![allow(non_snake_case)]
use crate::algebra::*;
use core::cmp::{max, min};
use derive_builder::Builder;
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`QDLDLFactorisation`](QDLDLFactorisation) factor operations

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QDLDLError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
    #[error("AMD ordering failed")]
    Ordering,
}

/// Settings for [`QDLDLFactorisation`](QDLDLFactorisation)
///
/// `Dsigns` gives the expected sign of each pivot.  When regularization is
/// enabled, any pivot `d` with `d*sign < regularize_eps` is replaced by
/// `regularize_delta*sign`.

#[derive(Builder, Debug, Clone)]
pub struct QDLDLSettings<T: FloatT> {
    #[builder(default = "1.0")]
    amd_dense_scale: f64,
    #[builder(default = "None", setter(strip_option))]
    Dsigns: Option<Vec<i8>>,
    #[builder(default = "true")]
    regularize_enable: bool,
    #[builder(default = "(1e-12).as_T()")]
    regularize_eps: T,
    #[builder(default = "(1e-7).as_T()")]
    regularize_delta: T,
}

impl<T> Default for QDLDLSettings<T>
where
    T: FloatT,
{
    fn default() -> QDLDLSettings<T> {
        QDLDLSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// $LDL^T$ factorization of a symmetric quasidefinite matrix, computed
/// once and then reused for any number of right hand sides.

#[derive(Debug)]
pub struct QDLDLFactorisation<T = f64> {
    /// fill reducing permutation
    pub perm: Vec<usize>,
    /// strictly lower triangular factor of the permuted matrix
    pub L: CscMatrix<T>,
    /// diagonal factor and its inverse
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    positive_inertia: usize,
    regularize_count: usize,
    // permuted solve workspace
    work: Vec<T>,
}

impl<T> QDLDLFactorisation<T>
where
    T: FloatT,
{
    /// Factor the upper triangular matrix `A` (symmetric storage).
    pub fn new(
        A: &CscMatrix<T>,
        opts: Option<QDLDLSettings<T>>,
    ) -> Result<QDLDLFactorisation<T>, QDLDLError> {
        check_structure(A)?;
        let opts = opts.unwrap_or_default();
        let n = A.ncols();

        let (perm, iperm) = amd_ordering(A, opts.amd_dense_scale)?;
        let PAPt = permute_symmetric(A, &iperm);

        // pivot signs follow the permutation
        let signs: Vec<i8> = match &opts.Dsigns {
            Some(ds) if ds.len() == n => perm.iter().map(|&p| ds[p]).collect(),
            Some(_) => return Err(QDLDLError::IncompatibleDimension),
            None => vec![1; n],
        };

        let (etree, Lnz) = elimination_tree(&PAPt);
        let mut colptr = vec![0; n + 1];
        for k in 0..n {
            colptr[k + 1] = colptr[k] + Lnz[k];
        }
        let nnzL = colptr[n];
        let mut L = CscMatrix::new(n, n, colptr, vec![0; nnzL], vec![T::zero(); nnzL]);

        let mut D = vec![T::zero(); n];
        let mut Dinv = vec![T::zero(); n];
        let reg = opts.regularize_enable.then_some((
            opts.regularize_eps,
            opts.regularize_delta,
        ));

        let (positive_inertia, regularize_count) =
            factor_numeric(&PAPt, &etree, &signs, reg, &mut L, &mut D, &mut Dinv)?;

        Ok(QDLDLFactorisation {
            perm,
            L,
            D,
            Dinv,
            positive_inertia,
            regularize_count,
            work: vec![T::zero(); n],
        })
    }

    /// Number of positive pivots in `D`
    pub fn positive_inertia(&self) -> usize {
        self.positive_inertia
    }

    /// Number of pivots replaced by dynamic regularization
    pub fn regularize_count(&self) -> usize {
        self.regularize_count
    }

    /// Solves `Ax = b` in place (x replaces b)
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.D.len());

        let x = &mut self.work;
        zip(x.iter_mut(), &self.perm).for_each(|(x, &p)| *x = b[p]);

        lsolve(&self.L, x);
        zip(x.iter_mut(), &self.Dinv).for_each(|(x, &d)| *x *= d);
        ltsolve(&self.L, x);

        zip(x.iter(), &self.perm).for_each(|(&x, &p)| b[p] = x);
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), QDLDLError> {
    if !A.is_square() {
        return Err(QDLDLError::IncompatibleDimension);
    }
    if !A.is_triu() {
        return Err(QDLDLError::NotUpperTriangular);
    }
    // need at least the diagonal in every column
    if A.colptr.windows(2).any(|c| c[0] >= c[1]) {
        return Err(QDLDLError::EmptyColumn);
    }
    Ok(())
}

fn amd_ordering<T: FloatT>(
    A: &CscMatrix<T>,
    dense_scale: f64,
) -> Result<(Vec<usize>, Vec<usize>), QDLDLError> {
    let mut control = amd::Control::default();
    control.dense *= dense_scale;
    let (perm, iperm, _info) = amd::order(A.nrows(), &A.colptr, &A.rowval, &control)
        .map_err(|_| QDLDLError::Ordering)?;
    Ok((perm, iperm))
}

// Upper triangle of P*A*P' for symmetric A held as its upper triangle.
// Rows within a column are left unsorted, which the factorization allows.
fn permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> CscMatrix<T> {
    let n = A.ncols();

    let target = |row: usize, col: usize| {
        let (r, c) = (iperm[row], iperm[col]);
        (min(r, c), max(r, c))
    };

    let mut counts = vec![0; n];
    for col in 0..n {
        for &row in &A.rowval[A.colptr[col]..A.colptr[col + 1]] {
            counts[target(row, col).1] += 1;
        }
    }

    let mut P = CscMatrix::spalloc((n, n), A.nnz());
    for k in 0..n {
        P.colptr[k + 1] = P.colptr[k] + counts[k];
    }

    let mut next = P.colptr[..n].to_vec();
    for col in 0..n {
        for ptr in A.colptr[col]..A.colptr[col + 1] {
            let (r, c) = target(A.rowval[ptr], col);
            P.rowval[next[c]] = r;
            P.nzval[next[c]] = A.nzval[ptr];
            next[c] += 1;
        }
    }
    P
}

const NO_PARENT: usize = usize::MAX;

// Elimination tree of an upper triangular matrix, and the number of
// subdiagonal nonzeros in each column of its factor.
fn elimination_tree<T: FloatT>(A: &CscMatrix<T>) -> (Vec<usize>, Vec<usize>) {
    let n = A.ncols();
    let mut etree = vec![NO_PARENT; n];
    let mut Lnz = vec![0; n];
    let mut flag = vec![0; n];

    for j in 0..n {
        flag[j] = j;
        for &row in &A.rowval[A.colptr[j]..A.colptr[j + 1]] {
            let mut i = row;
            while flag[i] != j {
                if etree[i] == NO_PARENT {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                flag[i] = j;
                i = etree[i];
            }
        }
    }
    (etree, Lnz)
}

// Up-looking numeric factorization.  Row k of L is found by a sparse
// triangular solve against column k of A, whose nonzero pattern is the
// union of etree paths from the column's entries.  Returns the number of
// positive pivots and the number of regularized pivots.
fn factor_numeric<T: FloatT>(
    A: &CscMatrix<T>,
    etree: &[usize],
    signs: &[i8],
    reg: Option<(T, T)>,
    L: &mut CscMatrix<T>,
    D: &mut [T],
    Dinv: &mut [T],
) -> Result<(usize, usize), QDLDLError> {
    let n = A.ncols();
    let mut visited = vec![false; n];
    let mut y = vec![T::zero(); n];
    let mut pattern: Vec<usize> = Vec::with_capacity(n);
    let mut path: Vec<usize> = Vec::with_capacity(n);
    let mut next = L.colptr[..n].to_vec();

    let mut positive = 0;
    let mut regularized = 0;

    for k in 0..n {
        pattern.clear();
        D[k] = T::zero();

        for ptr in A.colptr[k]..A.colptr[k + 1] {
            let i = A.rowval[ptr];
            if i == k {
                D[k] = A.nzval[ptr];
                continue;
            }
            y[i] = A.nzval[ptr];

            path.clear();
            let mut j = i;
            while j != NO_PARENT && j < k && !visited[j] {
                visited[j] = true;
                path.push(j);
                j = etree[j];
            }
            pattern.extend(path.iter().rev());
        }

        // descendants before ancestors
        for &c in pattern.iter().rev() {
            let yc = y[c];
            for ptr in L.colptr[c]..next[c] {
                y[L.rowval[ptr]] -= L.nzval[ptr] * yc;
            }
            let Lkc = yc * Dinv[c];
            L.rowval[next[c]] = k;
            L.nzval[next[c]] = Lkc;
            next[c] += 1;
            D[k] -= yc * Lkc;

            y[c] = T::zero();
            visited[c] = false;
        }

        if let Some((eps, delta)) = reg {
            let sign: T = if signs[k] < 0 { -T::one() } else { T::one() };
            if D[k] * sign < eps {
                D[k] = delta * sign;
                regularized += 1;
            }
        }

        if D[k] == T::zero() || !D[k].is_finite() {
            return Err(QDLDLError::ZeroPivot);
        }
        if D[k] > T::zero() {
            positive += 1;
        }
        Dinv[k] = T::recip(D[k]);
    }

    Ok((positive, regularized))
}

// Solves (L+I)x = b in place
fn lsolve<T: FloatT>(L: &CscMatrix<T>, x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let rng = L.colptr[i]..L.colptr[i + 1];
        for (&row, &Lij) in zip(&L.rowval[rng.clone()], &L.nzval[rng]) {
            x[row] -= Lij * xi;
        }
    }
}

// Solves (L+I)'x = b in place
fn ltsolve<T: FloatT>(L: &CscMatrix<T>, x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let rng = L.colptr[i]..L.colptr[i + 1];
        let s = zip(&L.rowval[rng.clone()], &L.nzval[rng])
            .fold(T::zero(), |acc, (&row, &Lij)| acc + Lij * x[row]);
        x[i] -= s;
    }
}

#[path = "test.rs"]
#[cfg(test)]
mod test;
