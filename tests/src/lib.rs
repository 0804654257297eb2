//! # Entity Relay Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # Cross-crate replication scenarios
//! │   ├── fixtures.rs    # Shared registry, stores and wait helpers
//! │   ├── replication.rs # Two workers on one transport
//! │   └── faults.rs      # Backpressure, closure, garbage on the wire
//! │
//! └── benches/           # Codec and reassembly throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p er-tests
//!
//! # By category
//! cargo test -p er-tests integration::replication
//! cargo test -p er-tests integration::faults
//!
//! # Benchmarks
//! cargo bench -p er-tests
//! ```

pub mod integration;
