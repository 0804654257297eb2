//! # ER-04 Replication Store
//!
//! Owns entity state and the transport session that replicates it.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//!                 connect() ok
//!  ┌──────────────┐ ──────────────→ ┌───────────┐
//!  │ Disconnected │                 │ Connected │
//!  └──────────────┘ ←────────────── └───────────┘
//!         ↑          disconnect() / transport closed
//!         └── connect() failed (TransportUnavailable)
//! ```
//!
//! ## Data Flow
//!
//! ```text
//!  set() ──local write──→ Entity
//!    └──UpdateEnvelope──→ outbound queue ──encode──→ bridge ──→ transport
//!
//!  transport ──→ bridge ──bytes──→ apply task ──decode──→ Entity::load
//!                                              (own origin dropped)
//! ```
//!
//! Applying an inbound envelope never enqueues it again.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod service;

// Re-exports
pub use domain::{
    Entity, ReplicationError, SetOutcome, StoreConfig, StoreState, StoreStats,
};
pub use service::ReplicationStore;
