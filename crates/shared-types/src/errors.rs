//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

use crate::entities::{ComponentId, OriginId, ValueType};

/// Errors raised when a value does not fit its component.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The value's shape does not match the declared type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueType,
        found: &'static str,
    },

    /// NaN and infinities cannot be carried on the wire.
    #[error("Non-finite float {0} cannot be replicated")]
    NonFiniteFloat(f64),

    /// A `null` document would be read as a removal by every receiver.
    #[error("A null JSON document cannot be replicated; set None to remove")]
    NullDocument,
}

/// Why an inbound message was discarded instead of applied.
///
/// All variants are handled the same way (the message is dropped) but are
/// kept apart for counters and log lines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeRejection {
    /// Bytes are not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// The component id has no registry entry.
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// The envelope was authored by this store (loopback).
    #[error("Envelope from own origin {0}")]
    SelfOrigin(OriginId),

    /// The value does not match the registered component type.
    #[error("Component {component} rejected value: {source}")]
    TypeMismatch {
        component: ComponentId,
        #[source]
        source: ValueError,
    },
}

impl DecodeRejection {
    /// Stable label for metrics and structured logs.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeRejection::Malformed(_) => "malformed",
            DecodeRejection::UnknownComponent(_) => "unknown_component",
            DecodeRejection::SelfOrigin(_) => "self_origin",
            DecodeRejection::TypeMismatch { .. } => "type_mismatch",
        }
    }
}
