//! # Shared Bus - Publish/Subscribe Transport
//!
//! The transport collaborator of the replication layer: a best-effort,
//! unordered byte-message channel addressed by `(channel, stream_id)`.
//!
//! ## Contract
//!
//! ```text
//! ┌──────────────┐   offer(bytes)    ┌──────────────┐   poll(limit)   ┌──────────────┐
//! │ Publication  │ ────────────────→ │  Transport   │ ──────────────→ │ Subscription │
//! │              │ ←── Accepted /    │  (fragments  │   Vec<Fragment> │              │
//! │              │     BackPressured │   by MTU)    │                 │              │
//! │              │     / Closed      │              │                 │              │
//! └──────────────┘                   └──────────────┘                 └──────────────┘
//! ```
//!
//! - `offer` never blocks; a full buffer answers `BackPressured`.
//! - `poll` never blocks; an empty buffer answers an empty batch.
//! - Messages larger than one frame are split into fragments flagged
//!   `BEGIN` / `END`. Reassembly is the consumer's job.
//!
//! `InMemoryTransport` implements the contract inside one process and is
//! suitable for tests and single-host demos; networked deployments plug in a
//! different `Transport`.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod fragment;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use fragment::{Fragment, BEGIN_FRAG_FLAG, END_FRAG_FLAG, UNFRAGMENTED};
pub use publisher::{
    InMemoryPublication, InMemoryTransport, InMemoryTransportConfig, OfferOutcome, Publication,
    Transport,
};
pub use subscriber::{InMemorySubscription, Subscription, TransportError};

/// Default maximum payload carried by a single fragment.
pub const DEFAULT_MTU: usize = 1408;

/// Default per-subscriber buffer capacity in bytes.
pub const DEFAULT_TERM_BUFFER_LENGTH: usize = 64 * 1024;

/// Accounting overhead charged per fragment against the buffer capacity.
pub const FRAME_HEADER_LENGTH: usize = 32;
