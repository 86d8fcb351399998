#![allow(non_snake_case)]

use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> CscMatrix<T> {
    /// Symmetric matrix-vector multiply `y = a*K*x + b*y`, where only the
    /// upper triangle of `K` is stored.
    pub fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        assert_eq!(self.m, self.n);
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.n);

        y.scale(b);

        for (col, &xcol) in x.iter().enumerate() {
            let rng = self.colptr[col]..self.colptr[col + 1];
            for (&row, &Kij) in zip(&self.rowval[rng.clone()], &self.nzval[rng]) {
                y[row] += a * Kij * xcol;
                // mirror strictly upper entries into the lower half
                if row != col {
                    y[col] += a * Kij * x[row];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symv() {
        // full matrix
        // [1  3  5]
        // [3  4  6]
        // [5  6  7]
        let K = CscMatrix::new(
            3,
            3,
            vec![0, 1, 3, 6],
            vec![0, 0, 1, 0, 1, 2],
            vec![1., 3., 4., 5., 6., 7.],
        );
        let x = [1., -1., 2.];
        let mut y = vec![1., 1., 1.];
        K.symv(&mut y, &x, 1.0, -1.0);
        assert_eq!(y, vec![7., 10., 12.]);
    }
}
