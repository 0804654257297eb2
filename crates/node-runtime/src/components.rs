//! Components registered by every demo worker.
//!
//! Ids must agree across workers; there is no negotiation.

use std::sync::Arc;

use er_01_component_registry::{ComponentKey, ComponentRegistry};

/// Horizontal position.
pub fn position_x() -> ComponentKey<f64> {
    ComponentKey::new("position_x", 1)
}

/// Remaining health points.
pub fn health() -> ComponentKey<i64> {
    ComponentKey::new("health", 2)
}

/// Display name.
pub fn label() -> ComponentKey<String> {
    ComponentKey::new("label", 3)
}

/// Registry holding every demo component.
pub fn registry() -> Arc<ComponentRegistry> {
    let registry = ComponentRegistry::new();
    registry.register_key(&position_x());
    registry.register_key(&health());
    registry.register_key(&label());
    Arc::new(registry)
}
