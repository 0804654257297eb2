//! # Domain Module
//!
//! Wire representation, codec errors and drop counters.

pub mod errors;
pub mod stats;
pub(crate) mod wire;

pub use errors::*;
pub use stats::*;
