//! # `UpdateEnvelope`
//!
//! The unit of replication: one component change on one entity, tagged with
//! the store that authored it.
//!
//! ## Wire Contract
//!
//! The envelope is the only durable cross-process contract. Its fields are
//! always written in the order `originId`, `entityId`, `componentId`,
//! `value`, and component ids must stay stable across versions sharing a
//! deployment.

use crate::entities::{ComponentId, ComponentValue, EntityId, OriginId};

/// A single replicated component change.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEnvelope {
    /// Store instance that authored the change. Sole input to loopback suppression.
    pub origin_id: OriginId,

    /// Target entity.
    pub entity_id: EntityId,

    /// Target component.
    pub component_id: ComponentId,

    /// New value, or `None` when the component was removed.
    pub value: Option<ComponentValue>,
}

impl UpdateEnvelope {
    /// Envelope carrying a new component value.
    #[must_use]
    pub fn set(
        origin_id: OriginId,
        entity_id: EntityId,
        component_id: ComponentId,
        value: ComponentValue,
    ) -> Self {
        Self {
            origin_id,
            entity_id,
            component_id,
            value: Some(value),
        }
    }

    /// Envelope carrying a component removal.
    #[must_use]
    pub fn remove(origin_id: OriginId, entity_id: EntityId, component_id: ComponentId) -> Self {
        Self {
            origin_id,
            entity_id,
            component_id,
            value: None,
        }
    }

    /// Returns true if this envelope removes the component.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.value.is_none()
    }
}
