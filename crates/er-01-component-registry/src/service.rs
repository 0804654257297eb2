//! # Component Registry Service
//!
//! Process-wide table of component descriptors, constructed explicitly and
//! shared through `Arc`.
//!
//! ## Thread Safety
//!
//! The table sits behind a `parking_lot::RwLock`; lookups take the read
//! lock only, so registration never exposes a half-written entry.

use parking_lot::RwLock;
use shared_types::ComponentId;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::{ComponentDescriptor, ComponentKey, ComponentType};
use crate::ports::inbound::ComponentLookup;

/// Table of registered component descriptors.
#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<ComponentId, ComponentDescriptor>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same id.
    ///
    /// A replacement means two component kinds claim the same wire id, which
    /// the deployment must prevent. The later registration wins and the
    /// replaced descriptor is returned.
    pub fn register(&self, descriptor: ComponentDescriptor) -> Option<ComponentDescriptor> {
        let id = descriptor.id;
        let replaced = self.components.write().insert(id, descriptor.clone());

        match &replaced {
            Some(old) => warn!(
                component_id = %id,
                replaced = %old,
                by = %descriptor,
                "Duplicate component registration, later registration wins"
            ),
            None => debug!(component = %descriptor, "Component registered"),
        }
        replaced
    }

    /// Register the descriptor of a typed key.
    pub fn register_key<T: ComponentType>(
        &self,
        key: &ComponentKey<T>,
    ) -> Option<ComponentDescriptor> {
        self.register(key.descriptor())
    }

    /// Get a descriptor by id.
    #[must_use]
    pub fn lookup(&self, id: ComponentId) -> Option<ComponentDescriptor> {
        self.components.read().get(&id).cloned()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }

    /// Snapshot of every descriptor, ordered by id.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        let mut all: Vec<_> = self.components.read().values().cloned().collect();
        all.sort_by_key(|d| d.id);
        all
    }
}

impl ComponentLookup for ComponentRegistry {
    fn lookup(&self, id: ComponentId) -> Option<ComponentDescriptor> {
        ComponentRegistry::lookup(self, id)
    }
}
