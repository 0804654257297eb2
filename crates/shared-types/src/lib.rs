//! # Shared Types Crate
//!
//! This crate contains the identifiers, component values and the
//! `UpdateEnvelope` exchanged between replication subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Envelope Authority**: The envelope's `origin_id` is the only field used
//!   for loopback suppression; payloads carry no identity of their own.
//! - **Fail Closed**: A value that does not match its component's declared
//!   type is rejected, never coerced.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::UpdateEnvelope;
pub use errors::*;
