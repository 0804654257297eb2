//! # ER-01 Component Registry
//!
//! Resolves small integer component ids to their declared value type.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The envelope codec needs to know how to interpret a component's value
//! before it can be applied. Every worker in a deployment registers the same
//! `(id, value_type)` pairs at startup; there is no negotiation.
//!
//! ## Rules
//!
//! | Rule | Behaviour |
//! |------|-----------|
//! | Duplicate id | Later registration wins, logged as a deployment warning |
//! | Removal | Not supported |
//! | Concurrency | Reads from any thread; writes expected during startup only |
//!
//! ## Module Structure
//!
//! ```text
//! er-01-component-registry/
//! ├── domain/          # ComponentDescriptor, ComponentKey<T>, ComponentType
//! ├── ports/           # ComponentLookup trait
//! └── service.rs       # ComponentRegistry
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{ComponentDescriptor, ComponentKey, ComponentType};
pub use ports::inbound::ComponentLookup;
pub use service::ComponentRegistry;
