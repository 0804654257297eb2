//! # Domain Module
//!
//! Component descriptors and typed component keys.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
