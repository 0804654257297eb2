//! # Domain Module
//!
//! Configuration, idle strategy, fragment reassembly and loop outcomes.

pub mod assembler;
pub mod config;
pub mod errors;
pub mod idle;
pub mod stats;

pub use assembler::FragmentAssembler;
pub use config::{BridgeConfig, IdleConfig};
pub use errors::BridgeError;
pub use idle::{BackoffIdle, IdlePhase};
pub use stats::{BridgeReport, LoopCounters, LoopExit, LoopStats};
