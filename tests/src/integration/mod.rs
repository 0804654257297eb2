//! # Integration Scenarios
//!
//! Scenarios that drive the registry, codec, bridge and store together
//! through a transport.

pub mod fixtures;

mod faults;
mod replication;
