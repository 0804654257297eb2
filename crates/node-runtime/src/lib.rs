//! # Node Runtime Library
//!
//! Building blocks of the `node-runtime` demo binary, exposed for tests.
//!
//! - `config` - `NodeConfig` read from `ER_*` environment variables
//! - `components` - the component set every demo worker registers
//! - `runtime` - `RelayNode`, two workers wired to one transport

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod components;
pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::{DemoReport, RelayNode};
