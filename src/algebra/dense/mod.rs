mod core;
mod types;

pub use self::types::*;
