//! # ER-02 Envelope Codec
//!
//! Converts `UpdateEnvelope`s to and from their wire form.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Wire Form
//!
//! ```text
//! {"originId":100,"entityId":7,"componentId":1,"value":3.5}
//! {"originId":100,"entityId":7,"componentId":1,"value":null}   <- removal
//! ```
//!
//! ## Decode Outcomes
//!
//! | Outcome | Result | Counter |
//! |---------|--------|---------|
//! | Bytes do not parse | `None` | `malformed` |
//! | `originId` is the local origin | `None` | `self_origin` |
//! | `componentId` not registered | `None` | `unknown_component` |
//! | Value does not match the registered type | `None` | `type_mismatch` |
//! | Otherwise | `Some(envelope)` | `decoded` |
//!
//! Checks run in that order, so loopback suppression happens before the
//! registry is consulted and before anything is applied. Rejections are
//! never surfaced as errors to the caller.

#![warn(clippy::all)]

pub mod domain;
pub mod service;

// Re-exports
pub use domain::{CodecError, CodecStats, CodecStatsSnapshot};
pub use service::EnvelopeCodec;
