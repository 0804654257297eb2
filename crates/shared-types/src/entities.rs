//! # Core Domain Entities
//!
//! Defines the identifiers and component values that flow through the
//! replication layer.
//!
//! ## Clusters
//!
//! - **Identity**: `OriginId`, `EntityId`, `ComponentId`
//! - **Values**: `ValueType`, `ComponentValue`

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::errors::ValueError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identifier of the store instance that authored an update.
///
/// Assigned once per store and constant for its lifetime. Two stores sharing
/// an origin id suppress each other's updates, so the space is 64 bits wide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OriginId(pub u64);

/// Identifier of a replicated entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// Identifier of a component kind.
///
/// Must be unique across every worker of a deployment; there is no
/// negotiation protocol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ComponentId(pub u16);

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: VALUES
// =============================================================================

/// Declared value type of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float. Integers on the wire are widened.
    Float,
    /// UTF-8 text.
    Text,
    /// Raw bytes, carried as an array of octets.
    Bytes,
    /// Arbitrary structured document.
    Json,
}

impl ValueType {
    /// Human-readable name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::Bytes => "bytes",
            ValueType::Json => "json",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component value tagged with its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
}

impl ComponentValue {
    /// Runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            ComponentValue::Bool(_) => ValueType::Bool,
            ComponentValue::Int(_) => ValueType::Int,
            ComponentValue::Float(_) => ValueType::Float,
            ComponentValue::Text(_) => ValueType::Text,
            ComponentValue::Bytes(_) => ValueType::Bytes,
            ComponentValue::Json(_) => ValueType::Json,
        }
    }

    /// Check that the value can be carried on the wire unchanged.
    ///
    /// JSON has no representation for NaN or infinities, and a top-level
    /// `null` document is indistinguishable from a removal on the wire.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            ComponentValue::Float(f) if !f.is_finite() => Err(ValueError::NonFiniteFloat(*f)),
            ComponentValue::Json(JsonValue::Null) => Err(ValueError::NullDocument),
            _ => Ok(()),
        }
    }

    /// Render the value as a JSON document.
    ///
    /// Non-finite floats render as `null`; call [`ComponentValue::validate`]
    /// first where that matters.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            ComponentValue::Bool(b) => JsonValue::Bool(*b),
            ComponentValue::Int(i) => JsonValue::from(*i),
            ComponentValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ComponentValue::Text(s) => JsonValue::String(s.clone()),
            ComponentValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| x.into()).collect()),
            ComponentValue::Json(v) => v.clone(),
        }
    }

    /// Interpret a JSON document as a value of the declared type.
    ///
    /// # Errors
    ///
    /// - `ValueError::TypeMismatch` - The document does not have the declared shape.
    pub fn from_json(expected: ValueType, json: JsonValue) -> Result<Self, ValueError> {
        let found = json_kind(&json);
        let mismatch = || ValueError::TypeMismatch { expected, found };

        match expected {
            ValueType::Bool => json.as_bool().map(ComponentValue::Bool).ok_or_else(mismatch),
            ValueType::Int => json.as_i64().map(ComponentValue::Int).ok_or_else(mismatch),
            ValueType::Float => json.as_f64().map(ComponentValue::Float).ok_or_else(mismatch),
            ValueType::Text => match json {
                JsonValue::String(s) => Ok(ComponentValue::Text(s)),
                _ => Err(mismatch()),
            },
            ValueType::Bytes => {
                let JsonValue::Array(items) = json else {
                    return Err(mismatch());
                };
                items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|n| u8::try_from(n).ok())
                            .ok_or(ValueError::TypeMismatch {
                                expected,
                                found: "array",
                            })
                    })
                    .collect::<Result<Vec<u8>, _>>()
                    .map(ComponentValue::Bytes)
            }
            ValueType::Json => Ok(ComponentValue::Json(json)),
        }
    }
}

/// Short name of a JSON document's shape, for diagnostics.
fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(n) if n.is_f64() => "float",
        JsonValue::Number(_) => "int",
        JsonValue::String(_) => "text",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
