#![allow(clippy::module_inception)]
//! Timers for the setup and solve phases.

mod timers;
pub use timers::*;
