#![allow(non_snake_case)]

use crate::algebra::{FloatT, ShapedMatrix, SparseFormatError};

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// Used internally for the upper triangle of each partition's
/// quasidefinite KKT matrix.
///
/// __Example usage__ : To construct the 3 x 3 upper triangular matrix
/// ```text
/// K = [1.  3.  5.]
///     [0.  4.  6.]
///     [0.  0.  7.]
/// ```
///
/// ```no_run
/// use lpadmm::algebra::CscMatrix;
///
/// let K : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 1, 3, 6],                 //colptr
///    vec![0, 0, 1, 0, 1, 2],           //rowval
///    vec![1., 3., 4., 5., 6., 7.],     //nzval
///  );
///
/// assert!(K.check_format().is_ok());
/// assert!(K.is_triu());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer, of length `n+1`
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Panics if the array lengths are mutually inconsistent.  Row
    /// ordering and bounds are not checked here; see
    /// [`check_format`](CscMatrix::check_format).
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for a sparse matrix with `nnz` elements
    pub fn spalloc(size: (usize, usize), nnz: usize) -> Self {
        let (m, n) = size;
        let mut colptr = vec![0; n + 1];
        colptr[n] = nnz;
        CscMatrix::new(m, n, colptr, vec![0; nnz], vec![T::zero(); nnz])
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len()
            || self.colptr.len() != self.n + 1
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }
        if self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }
        for col in 0..self.n {
            let rows = &self.rowval[self.colptr[col]..self.colptr[col + 1]];
            if rows.windows(2).any(|r| r[0] >= r[1]) {
                return Err(SparseFormatError::BadRowval);
            }
        }
        if self.rowval.iter().any(|&r| r >= self.m) {
            return Err(SparseFormatError::BadRowval);
        }
        Ok(())
    }

    /// True if no structural entries lie below the diagonal
    pub fn is_triu(&self) -> bool {
        (0..self.n).all(|col| {
            self.rowval[self.colptr[col]..self.colptr[col + 1]]
                .iter()
                .all(|&row| row <= col)
        })
    }

    /// Value at `(row, col)`, or `None` if not a structural nonzero.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<T> {
        let (row, col) = idx;
        assert!(row < self.m && col < self.n);
        let first = self.colptr[col];
        let rows = &self.rowval[first..self.colptr[col + 1]];
        rows.binary_search(&row).ok().map(|k| self.nzval[first + k])
    }
}

impl<T> ShapedMatrix for CscMatrix<T> {
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
}
