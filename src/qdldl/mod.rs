//! Sparse $LDL^T$ factorization of symmetric quasidefinite matrices.
//!
//! Each ADMM partition factors its KKT matrix once with this module and
//! then back-substitutes against a new right hand side every iteration.

mod qdldl;
pub use self::qdldl::*;
