//! # Inbound Ports
//!
//! Read-side API the envelope codec depends on.

use crate::domain::ComponentDescriptor;
use shared_types::ComponentId;

/// Resolves component ids to descriptors.
pub trait ComponentLookup: Send + Sync {
    /// Get a descriptor by id, or `None` if the id was never registered.
    fn lookup(&self, id: ComponentId) -> Option<ComponentDescriptor>;
}
