//! __lpadmm__ is a consensus ADMM solver for the soft margin linear program
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & -\rho + D \sum_j \xi_j \\\\\[2ex\]
//!  \text{subject to} & H_j^\top a + \xi_j \ge \rho, \quad \xi \ge 0 \\\\\[1ex\]
//!         & \mathbf{1}^\top a = 1, \quad a \ge 0
//!  \end{array}
//! $$
//!
//! with data matrix $H \in \mathbb{R}^{p \times n}$ whose columns $H_j$ are
//! data points, box bound $D \in (0, 1]$, weights $a \in \mathbb{R}^p$,
//! threshold $\rho$ and slacks $\xi \in \mathbb{R}^n$.
//!
//! The columns of $H$ are split into partitions, each solving a small
//! equality constrained QP with a cached sparse LDLᵀ factorization.  The
//! partitions agree on the shared block $(\rho, a)$ through a consensus
//! average once per iteration.
//!
//! ## Features
//!
//! * __Partitioned__: per-partition x-updates run on a `rayon` thread pool
//!   with the `parallel` feature (on by default).
//!
//! * __Line search fallback__: runs that hit the iteration limit are refined
//!   by a bisection search between reference points taken from the
//!   iteration history.
//!
//! * __Dual recovery__: the box constrained multipliers can be recovered
//!   exactly from the primal solution by a bounded least squares solve.
//!
//! # Example
//!
//! ```no_run
//! use lpadmm::algebra::Matrix;
//! use lpadmm::solver::{AdmmSettingsBuilder, AdmmSolver};
//!
//! let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
//! let settings = AdmmSettingsBuilder::default()
//!     .npar(1)
//!     .tol(1e-6)
//!     .reltol(1e-4)
//!     .recover_duals(true)
//!     .verbose(true)
//!     .build()
//!     .unwrap();
//!
//! let mut solver = AdmmSolver::new(&H, 0.5, settings).unwrap();
//! solver.solve().unwrap();
//! assert_eq!(solver.solution.exitflag, 1);
//! ```
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]
#![allow(uncommon_codepoints)]

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algebra;
pub mod io;
pub mod qdldl;
pub mod solver;
pub mod timers;
