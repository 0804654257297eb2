//! Wire representation of an envelope.
//!
//! Field declaration order is the wire field order and must not change.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEnvelopeOut {
    pub origin_id: u64,
    pub entity_id: u32,
    pub component_id: u16,
    pub value: JsonValue,
}

/// Header fields are parsed first so the origin can be checked before the
/// value is interpreted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEnvelopeIn {
    pub origin_id: u64,
    pub entity_id: u32,
    pub component_id: u16,
    /// Missing and `null` both mean removal.
    #[serde(default)]
    pub value: JsonValue,
}
