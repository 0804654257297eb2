//! # Replication Store Service
//!
//! Entity table, local writes and the outbound queue. The transport session
//! lifecycle lives in `lifecycle`.

mod lifecycle;

#[cfg(test)]
mod tests;

use crate::domain::{
    Entity, ReplicationError, SetOutcome, StoreConfig, StoreState, StoreStats,
};
use er_01_component_registry::{ComponentDescriptor, ComponentKey, ComponentLookup, ComponentType};
use er_02_envelope_codec::EnvelopeCodec;
use lifecycle::Lifecycle;
use parking_lot::{Mutex, RwLock};
use shared_bus::Transport;
use shared_types::{ComponentValue, EntityId, OriginId, UpdateEnvelope};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Entity state plus the transport session replicating it.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ReplicationStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    origin_id: OriginId,
    config: StoreConfig,
    codec: Arc<EnvelopeCodec>,
    registry: Arc<dyn ComponentLookup>,
    transport: Arc<dyn Transport>,
    entities: RwLock<HashMap<EntityId, Arc<Entity>>>,
    lifecycle: Mutex<Lifecycle>,
    sessions_started: AtomicU64,
    counters: StoreCounters,
}

#[derive(Default)]
struct StoreCounters {
    local_writes: AtomicU64,
    enqueued: AtomicU64,
    applied: AtomicU64,
}

impl ReplicationStore {
    /// Create a disconnected store.
    ///
    /// `registry` resolves inbound component ids; `transport` is used by
    /// every later `connect()`.
    pub fn new(
        config: StoreConfig,
        registry: Arc<dyn ComponentLookup>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let origin_id = config
            .origin_id
            .unwrap_or_else(|| OriginId(rand::random::<u64>()));
        let codec = Arc::new(EnvelopeCodec::new(origin_id, Arc::clone(&registry)));

        info!(origin = %origin_id, "Replication store created");

        Self {
            inner: Arc::new(StoreInner {
                origin_id,
                config,
                codec,
                registry,
                transport,
                entities: RwLock::new(HashMap::new()),
                lifecycle: Mutex::new(Lifecycle::Disconnected),
                sessions_started: AtomicU64::new(0),
                counters: StoreCounters::default(),
            }),
        }
    }

    /// Origin id stamped on every envelope this store publishes.
    #[must_use]
    pub fn origin_id(&self) -> OriginId {
        self.inner.origin_id
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get an entity, creating it on first access.
    #[must_use]
    pub fn get(&self, entity_id: EntityId) -> Arc<Entity> {
        self.inner.entity(entity_id)
    }

    /// Typed read of one component.
    #[must_use]
    pub fn get_typed<T: ComponentType>(
        &self,
        entity_id: EntityId,
        key: &ComponentKey<T>,
    ) -> Option<T> {
        self.get(entity_id).get_typed(key)
    }

    /// Write a component locally and, when connected, queue it for
    /// replication. `None` removes the component.
    ///
    /// The value is checked against the store's registry, not against the
    /// caller's descriptor.
    ///
    /// # Errors
    ///
    /// - `ReplicationError::UnknownComponent` - The id is not registered.
    /// - `ReplicationError::TypeMismatch` - The value does not have the
    ///   registered type or has no wire form (non-finite float, `null`
    ///   document). Nothing is written.
    pub fn set(
        &self,
        entity_id: EntityId,
        component: &ComponentDescriptor,
        value: Option<ComponentValue>,
    ) -> Result<SetOutcome, ReplicationError> {
        let registered = self
            .inner
            .registry
            .lookup(component.id)
            .ok_or(ReplicationError::UnknownComponent(component.id))?;
        if registered.value_type != component.value_type {
            warn!(
                component = %component,
                registered = %registered,
                "Descriptor disagrees with the registry, checking against the registry"
            );
        }

        if let Some(value) = &value {
            value
                .validate()
                .and_then(|()| registered.check(value))
                .map_err(|source| ReplicationError::TypeMismatch {
                    component: component.id,
                    source,
                })?;
        }

        let entity = self.get(entity_id);
        let envelope = UpdateEnvelope {
            origin_id: self.inner.origin_id,
            entity_id,
            component_id: component.id,
            value: value.clone(),
        };

        // Held across the local write so queue order matches write order.
        let lifecycle = self.inner.lifecycle.lock();
        entity.load(component.id, value);
        self.inner.counters.local_writes.fetch_add(1, Ordering::Relaxed);

        let outcome = if lifecycle.enqueue(envelope) {
            self.inner.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            SetOutcome::Enqueued
        } else {
            SetOutcome::LocalOnly
        };
        trace!(
            entity = %entity_id,
            component = %component.id,
            ?outcome,
            "Component set"
        );
        Ok(outcome)
    }

    /// Typed write of one component.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicationStore::set`].
    pub fn set_typed<T: ComponentType>(
        &self,
        entity_id: EntityId,
        key: &ComponentKey<T>,
        value: Option<T>,
    ) -> Result<SetOutcome, ReplicationError> {
        self.set(entity_id, &key.descriptor(), value.map(T::into_value))
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.inner.lifecycle.lock().state()
    }

    /// Number of entities created so far.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.inner.entities.read().len()
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let (state, bridge) = {
            let lifecycle = self.inner.lifecycle.lock();
            (
                lifecycle.state(),
                lifecycle.bridge_stats().unwrap_or_default(),
            )
        };
        let counters = &self.inner.counters;
        StoreStats {
            origin_id: self.inner.origin_id,
            state,
            entities: self.entity_count(),
            local_writes: counters.local_writes.load(Ordering::Relaxed),
            envelopes_enqueued: counters.enqueued.load(Ordering::Relaxed),
            envelopes_applied: counters.applied.load(Ordering::Relaxed),
            codec: self.inner.codec.stats(),
            bridge,
        }
    }
}

impl StoreInner {
    fn entity(&self, entity_id: EntityId) -> Arc<Entity> {
        if let Some(entity) = self.entities.read().get(&entity_id) {
            return Arc::clone(entity);
        }
        let mut entities = self.entities.write();
        Arc::clone(
            entities
                .entry(entity_id)
                .or_insert_with(|| Arc::new(Entity::new(entity_id))),
        )
    }

    /// Decode inbound bytes and load the result without re-enqueueing it.
    fn apply(&self, bytes: &[u8]) {
        let Some(envelope) = self.codec.decode(bytes) else {
            return;
        };
        let entity = self.entity(envelope.entity_id);
        entity.load(envelope.component_id, envelope.value);
        self.counters.applied.fetch_add(1, Ordering::Relaxed);
        trace!(
            origin = %envelope.origin_id,
            entity = %envelope.entity_id,
            component = %envelope.component_id,
            "Applied remote update"
        );
    }
}

impl std::fmt::Debug for ReplicationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationStore")
            .field("origin_id", &self.inner.origin_id)
            .field("state", &self.state())
            .field("entities", &self.entity_count())
            .finish()
    }
}
