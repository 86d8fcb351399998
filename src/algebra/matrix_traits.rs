use crate::algebra::MatrixShape;

/// Dimension queries shared by the dense and sparse matrix types
pub trait ShapedMatrix {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn size(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }
}

/// Matrix-vector products
pub trait MatrixVectorMultiply {
    type T;

    /// BLAS-like general matrix-vector multiply.
    ///
    /// Produces `y = a*op(A)*x + b*y`, where `op(A)` is `A` for
    /// [`MatrixShape::N`] and `A'` for [`MatrixShape::T`]
    fn gemv(&self, y: &mut [Self::T], trans: MatrixShape, x: &[Self::T], a: Self::T, b: Self::T);
}
