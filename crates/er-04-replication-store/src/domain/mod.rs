//! # Domain Module
//!
//! - `entities` - Entity and its component map
//! - `errors` - Store errors
//! - `value_objects` - Configuration, lifecycle state and statistics

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::Entity;
pub use errors::ReplicationError;
pub use value_objects::{SetOutcome, StoreConfig, StoreState, StoreStats};
