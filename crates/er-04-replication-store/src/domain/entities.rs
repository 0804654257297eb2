//! # Domain Entities

use er_01_component_registry::{ComponentKey, ComponentType};
use parking_lot::RwLock;
use shared_types::{ComponentId, ComponentValue, EntityId};
use std::collections::HashMap;

/// An entity: a sparse map from component id to value.
///
/// Each component set or removal is atomic with respect to readers.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    components: RwLock<HashMap<ComponentId, ComponentValue>>,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current value of a component, if present.
    #[must_use]
    pub fn get(&self, component: ComponentId) -> Option<ComponentValue> {
        self.components.read().get(&component).cloned()
    }

    /// Current value of a typed component, if present with the key's type.
    #[must_use]
    pub fn get_typed<T: ComponentType>(&self, key: &ComponentKey<T>) -> Option<T> {
        self.components
            .read()
            .get(&key.id())
            .and_then(T::from_value)
    }

    #[must_use]
    pub fn contains(&self, component: ComponentId) -> bool {
        self.components.read().contains_key(&component)
    }

    /// Store or remove (`None`) a value without replicating it.
    ///
    /// Returns the previous value.
    pub fn load(
        &self,
        component: ComponentId,
        value: Option<ComponentValue>,
    ) -> Option<ComponentValue> {
        let mut components = self.components.write();
        match value {
            Some(value) => components.insert(component, value),
            None => components.remove(&component),
        }
    }

    /// Ids of the components present, ascending.
    #[must_use]
    pub fn component_ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self.components.read().keys().copied().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }
}
