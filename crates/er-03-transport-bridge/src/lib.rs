//! # ER-03 Transport Bridge
//!
//! Moves bytes between in-process queues and a publish/subscribe transport.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Loops
//!
//! ```text
//!   OutboundSource ──next_into──→ [outbound loop] ──offer──→ Publication
//!                                     │ BackPressured / NotConnected / AdminAction
//!                                     └─→ idle, retry the same bytes
//!
//!   Subscription ──poll(limit)──→ [inbound loop] ──assemble──→ UnboundedSender<Vec<u8>>
//!                                     │ zero fragments
//!                                     └─→ idle
//! ```
//!
//! Both loops run as tokio tasks and observe one shared shutdown signal.
//! Either loop exiting with `LoopExit::TransportClosed` raises the bridge
//! fault, which owners observe through [`BridgeHandle::fault`].
//!
//! ## Idle Strategy
//!
//! | Phase | Action | Leaves after |
//! |-------|--------|--------------|
//! | Spin | `std::hint::spin_loop` | `max_spins` idles |
//! | Yield | `tokio::task::yield_now` | `max_yields` idles |
//! | Park | `tokio::time::sleep`, doubling from `min_park` | never (capped at `max_park`) |
//!
//! Any unit of work resets the strategy to the spin phase.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;
pub mod testing;

// Re-exports
pub use domain::{
    BackoffIdle, BridgeConfig, BridgeError, BridgeReport, FragmentAssembler, IdleConfig,
    IdlePhase, LoopExit, LoopStats,
};
pub use ports::outbound::OutboundSource;
pub use service::{BridgeHandle, TransportBridge};
