//! # Domain Entities
//!
//! The component descriptor registered once per component kind.

use shared_types::{ComponentId, ComponentValue, ValueError, ValueType};
use std::fmt;

/// Registered description of a component kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Name for this component. Should be unique for readability of logs.
    pub name: String,
    /// Id carried on the wire. Must be unique across the deployment.
    pub id: ComponentId,
    /// Type every value of this component must have.
    pub value_type: ValueType,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, id: u16, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            id: ComponentId(id),
            value_type,
        }
    }

    /// Check that `value` has this component's declared type.
    ///
    /// # Errors
    ///
    /// - `ValueError::TypeMismatch` - The value's runtime type differs.
    pub fn check(&self, value: &ComponentValue) -> Result<(), ValueError> {
        let found = value.value_type();
        if found != self.value_type {
            return Err(ValueError::TypeMismatch {
                expected: self.value_type,
                found: found.name(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:{}", self.name, self.id, self.value_type)
    }
}
