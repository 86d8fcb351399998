//! Consensus ADMM solver for the partitioned soft margin LP.
//!
//! The entry point is [`AdmmSolver`], configured through
//! [`AdmmSettingsBuilder`].  After a call to [`AdmmSolver::solve`] the
//! result is available in the public `solution` field as an
//! [`AdmmSolution`], with progress information in `info`.
//!
//! Dual recovery and evaluation of the exact LP objective are also
//! available standalone through [`recover_duals`] and [`true_objective`].

mod admm;
mod consensus;
mod dual_recovery;
mod error;
mod history;
mod info;
mod info_print;
mod kktsolver;
mod linesearch;
mod partition;
mod problem;
mod residuals;
mod settings;
mod solution;

#[cfg(feature = "serde")]
mod json;

pub use admm::*;
pub use dual_recovery::*;
pub use error::*;
pub use history::*;
pub use info::*;
pub use linesearch::{LinesearchReport, LinesearchStrategy};
pub use residuals::*;
pub use settings::*;
pub use solution::*;

pub(crate) use problem::ProblemData;
pub use problem::true_objective;

#[cfg(feature = "serde")]
pub use json::*;
