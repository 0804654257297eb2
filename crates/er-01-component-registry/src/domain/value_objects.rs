//! # Value Objects
//!
//! Typed component keys. A `ComponentKey<T>` ties a component id to a Rust
//! type so application code reads and writes components without matching on
//! `ComponentValue` by hand.

use serde_json::Value as JsonValue;
use shared_types::{ComponentId, ComponentValue, ValueType};
use std::fmt;
use std::marker::PhantomData;

use super::entities::ComponentDescriptor;

/// Rust types that can be stored as a component value.
pub trait ComponentType: Sized + Send + Sync + 'static {
    /// Declared value type for components of this Rust type.
    const VALUE_TYPE: ValueType;

    /// Wrap into a tagged value.
    fn into_value(self) -> ComponentValue;

    /// Unwrap from a tagged value of the same type.
    fn from_value(value: &ComponentValue) -> Option<Self>;
}

macro_rules! component_type {
    ($ty:ty, $variant:ident) => {
        impl ComponentType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> ComponentValue {
                ComponentValue::$variant(self)
            }

            fn from_value(value: &ComponentValue) -> Option<Self> {
                match value {
                    ComponentValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

component_type!(bool, Bool);
component_type!(i64, Int);
component_type!(f64, Float);
component_type!(String, Text);
component_type!(Vec<u8>, Bytes);
component_type!(JsonValue, Json);

/// Typed handle on a component kind.
pub struct ComponentKey<T: ComponentType> {
    name: String,
    id: ComponentId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ComponentType> ComponentKey<T> {
    pub fn new(name: impl Into<String>, id: u16) -> Self {
        Self {
            name: name.into(),
            id: ComponentId(id),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor to register for this key.
    #[must_use]
    pub fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor {
            name: self.name.clone(),
            id: self.id,
            value_type: T::VALUE_TYPE,
        }
    }
}

impl<T: ComponentType> Clone for ComponentKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T: ComponentType> fmt::Debug for ComponentKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKey")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("value_type", &T::VALUE_TYPE)
            .finish()
    }
}
