//! # Envelope Codec Service
//!
//! Encodes outbound envelopes and filters inbound bytes down to the
//! envelopes this store should apply.

use crate::domain::wire::{WireEnvelopeIn, WireEnvelopeOut};
use crate::domain::{CodecError, CodecStats, CodecStatsSnapshot};
use er_01_component_registry::ComponentLookup;
use serde_json::Value as JsonValue;
use shared_types::{
    ComponentId, ComponentValue, DecodeRejection, EntityId, OriginId, UpdateEnvelope,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Wire codec bound to one store's origin id and component registry.
pub struct EnvelopeCodec {
    local_origin: OriginId,
    registry: Arc<dyn ComponentLookup>,
    stats: CodecStats,
}

impl EnvelopeCodec {
    pub fn new(local_origin: OriginId, registry: Arc<dyn ComponentLookup>) -> Self {
        Self {
            local_origin,
            registry,
            stats: CodecStats::default(),
        }
    }

    /// Origin id treated as "self" by [`Self::decode`].
    #[must_use]
    pub fn local_origin(&self) -> OriginId {
        self.local_origin
    }

    /// Serialize an envelope to its wire form.
    ///
    /// Removal is written as an explicit `null` value.
    ///
    /// # Errors
    ///
    /// - `CodecError::Unrepresentable` - The value has no faithful wire form.
    /// - `CodecError::Serialize` - The JSON writer failed.
    pub fn encode(&self, envelope: &UpdateEnvelope) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode_into(envelope, &mut buf)?;
        Ok(buf)
    }

    /// Append the wire form of `envelope` to `buf`.
    ///
    /// # Errors
    ///
    /// - `CodecError::Unrepresentable` - The value has no faithful wire form.
    ///   Nothing is written.
    /// - `CodecError::Serialize` - The JSON writer failed. `buf` may hold a
    ///   partial write.
    pub fn encode_into(
        &self,
        envelope: &UpdateEnvelope,
        buf: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        if let Some(value) = &envelope.value {
            value
                .validate()
                .map_err(|source| CodecError::Unrepresentable {
                    component: envelope.component_id,
                    source,
                })?;
        }
        let wire = WireEnvelopeOut {
            origin_id: envelope.origin_id.0,
            entity_id: envelope.entity_id.0,
            component_id: envelope.component_id.0,
            value: envelope
                .value
                .as_ref()
                .map_or(JsonValue::Null, ComponentValue::to_json),
        };
        serde_json::to_writer(&mut *buf, &wire)?;
        self.stats.record_encoded();
        Ok(())
    }

    /// Decode inbound bytes, returning `None` for anything that must not be
    /// applied.
    ///
    /// Every outcome is counted and logged; nothing is raised.
    pub fn decode(&self, bytes: &[u8]) -> Option<UpdateEnvelope> {
        match self.decode_detailed(bytes) {
            Ok(envelope) => {
                self.stats.record_decoded();
                trace!(
                    origin = %envelope.origin_id,
                    entity = %envelope.entity_id,
                    component = %envelope.component_id,
                    removal = envelope.is_removal(),
                    "Decoded envelope"
                );
                Some(envelope)
            }
            Err(rejection) => {
                self.stats.record_rejection(&rejection);
                match &rejection {
                    DecodeRejection::SelfOrigin(_) => {
                        trace!(reason = rejection.reason(), "Suppressed loopback envelope");
                    }
                    _ => {
                        debug!(
                            reason = rejection.reason(),
                            len = bytes.len(),
                            "Dropped inbound envelope: {}",
                            rejection
                        );
                    }
                }
                None
            }
        }
    }

    /// Decode inbound bytes and report why a message was rejected.
    ///
    /// Checks run in a fixed order: parse, origin, registry, value type.
    /// Does not touch the counters.
    ///
    /// # Errors
    ///
    /// Returns the first `DecodeRejection` that applies.
    pub fn decode_detailed(&self, bytes: &[u8]) -> Result<UpdateEnvelope, DecodeRejection> {
        let wire: WireEnvelopeIn = serde_json::from_slice(bytes)
            .map_err(|e| DecodeRejection::Malformed(e.to_string()))?;

        let origin_id = OriginId(wire.origin_id);
        if origin_id == self.local_origin {
            return Err(DecodeRejection::SelfOrigin(origin_id));
        }

        let component_id = ComponentId(wire.component_id);
        let descriptor = self
            .registry
            .lookup(component_id)
            .ok_or(DecodeRejection::UnknownComponent(component_id))?;

        let value = match wire.value {
            JsonValue::Null => None,
            json => Some(
                ComponentValue::from_json(descriptor.value_type, json).map_err(|source| {
                    DecodeRejection::TypeMismatch {
                        component: component_id,
                        source,
                    }
                })?,
            ),
        };

        Ok(UpdateEnvelope {
            origin_id,
            entity_id: EntityId(wire.entity_id),
            component_id,
            value,
        })
    }

    #[must_use]
    pub fn stats(&self) -> CodecStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for EnvelopeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCodec")
            .field("local_origin", &self.local_origin)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
