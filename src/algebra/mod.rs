//! Scalar traits, vector math and the small set of dense and sparse
//! matrix primitives used by the ADMM solver.
//!
//! The dense [`Matrix`] type holds the problem data `H`.  Each partition
//! assembles its KKT matrix as a [`CscMatrix`] for factorization by
//! [`QDLDLFactorisation`](crate::qdldl::QDLDLFactorisation).

#![allow(non_snake_case)]

// T = transpose, N = non-transposed
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum MatrixShape {
    N,
    T,
}

mod csc;
mod dense;
mod error_types;
mod floats;
mod least_squares;
mod math_traits;
mod matrix_traits;
mod projections;
mod vecmath;

pub use csc::*;
pub use dense::*;
pub use error_types::*;
pub use floats::*;
pub use least_squares::*;
pub use math_traits::*;
pub use matrix_traits::*;
pub use projections::*;
