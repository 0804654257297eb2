//! # Adapters
//!
//! - `outbound_queue` - Feeds the bridge from the store's envelope queue.

pub mod outbound_queue;

pub use outbound_queue::EncodingSource;
