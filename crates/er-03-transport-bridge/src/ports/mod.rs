//! # Ports
//!
//! - `outbound` - Where the outbound loop takes its messages from.

pub mod outbound;
