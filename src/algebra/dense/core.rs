#![allow(non_snake_case)]
use crate::algebra::*;
use std::iter::zip;

impl<T> Matrix<T>
where
    T: FloatT,
{
    pub fn zeros(size: (usize, usize)) -> Self {
        let (m, n) = size;
        let data = vec![T::zero(); m * n];
        Self { m, n, data }
    }

    /// New matrix built from a subset of columns, in the order given.
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let mut data = Vec::with_capacity(self.m * cols.len());
        for &c in cols {
            data.extend_from_slice(self.col_slice(c));
        }
        Self {
            m: self.m,
            n: cols.len(),
            data,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.is_finite()
    }
}

impl<T> MatrixVectorMultiply for Matrix<T>
where
    T: FloatT,
{
    type T = T;

    fn gemv(&self, y: &mut [T], trans: MatrixShape, x: &[T], a: T, b: T) {
        match trans {
            MatrixShape::N => {
                assert_eq!(x.len(), self.n);
                assert_eq!(y.len(), self.m);
                y.scale(b);
                for (col, &xc) in x.iter().enumerate() {
                    let axc = a * xc;
                    zip(&mut *y, self.col_slice(col)).for_each(|(y, &v)| *y += axc * v);
                }
            }
            MatrixShape::T => {
                assert_eq!(x.len(), self.m);
                assert_eq!(y.len(), self.n);
                for (col, yc) in y.iter_mut().enumerate() {
                    *yc = a * self.col_slice(col).dot(x) + b * (*yc);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemv() {
        let A = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);

        let mut y = vec![1., 1.];
        A.gemv(&mut y, MatrixShape::N, &[1., 0., 1.], 1.0, 2.0);
        assert_eq!(y, vec![6., 6.]);

        let mut y = vec![0.; 3];
        A.gemv(&mut y, MatrixShape::T, &[0.5, 0.5], 1.0, 0.0);
        assert_eq!(y, vec![2., 2., 2.]);
    }

    #[test]
    fn test_select_columns() {
        let A = Matrix::from(&[[1., 2., 3.], [4., 5., 6.]]);
        let B = A.select_columns(&[2, 0]);
        assert_eq!(B, Matrix::from(&[[3., 1.], [6., 4.]]));
    }
}
