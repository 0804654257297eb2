//! Tests for ReplicationStore

use super::*;
use er_01_component_registry::ComponentRegistry;
use er_03_transport_bridge::LoopStats;
use er_03_transport_bridge::testing::{
    PublicationProbe, ScriptedPublication, ScriptedSubscription, ScriptedTransport,
    SubscriptionFeed,
};
use shared_bus::{InMemoryTransport, OfferOutcome, TransportError};
use shared_types::{ComponentId, ValueError, ValueType};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);
const LOCAL: OriginId = OriginId(100);
const REMOTE: OriginId = OriginId(200);

fn registry() -> Arc<ComponentRegistry> {
    let registry = ComponentRegistry::new();
    registry.register(health());
    registry.register(ComponentDescriptor::new("name", 2, ValueType::Text));
    registry.register(ComponentDescriptor::new("doc", 3, ValueType::Json));
    Arc::new(registry)
}

fn health() -> ComponentDescriptor {
    ComponentDescriptor::new("health", 1, ValueType::Float)
}

fn config() -> StoreConfig {
    StoreConfig::default().with_origin(LOCAL)
}

fn offline_store() -> ReplicationStore {
    ReplicationStore::new(config(), registry(), Arc::new(InMemoryTransport::new()))
}

fn scripted_store(
    script: Vec<OfferOutcome>,
) -> (ReplicationStore, PublicationProbe, SubscriptionFeed) {
    let (publication, probe) = ScriptedPublication::new(script);
    let (subscription, feed) = ScriptedSubscription::new();
    let transport = ScriptedTransport::new(publication, subscription);
    let store = ReplicationStore::new(config(), registry(), Arc::new(transport));
    (store, probe, feed)
}

/// Wire bytes of an update authored by `origin`.
fn wire(origin: OriginId, entity: u32, value: f64) -> Vec<u8> {
    EnvelopeCodec::new(origin, registry())
        .encode(&UpdateEnvelope::set(
            origin,
            EntityId(entity),
            ComponentId(1),
            ComponentValue::Float(value),
        ))
        .unwrap()
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    check()
}

// =============================================================================
// Local state
// =============================================================================

#[test]
fn test_get_creates_entity_once() {
    let store = offline_store();

    let first = store.get(EntityId(7));
    let second = store.get(EntityId(7));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.entity_count(), 1);
}

#[test]
fn test_set_while_disconnected_is_local_only() {
    let store = offline_store();

    let outcome = store
        .set(EntityId(7), &health(), Some(ComponentValue::Float(3.5)))
        .unwrap();

    assert_eq!(outcome, SetOutcome::LocalOnly);
    assert_eq!(
        store.get(EntityId(7)).get(ComponentId(1)),
        Some(ComponentValue::Float(3.5))
    );
    assert_eq!(store.stats().envelopes_enqueued, 0);
    assert_eq!(store.stats().local_writes, 1);
}

#[test]
fn test_set_rejects_type_mismatch_without_writing() {
    let store = offline_store();

    let result = store.set(EntityId(1), &health(), Some(ComponentValue::Text("full".into())));

    assert!(matches!(
        result,
        Err(ReplicationError::TypeMismatch { component, .. }) if component == ComponentId(1)
    ));
    assert!(store.get(EntityId(1)).is_empty());
    assert_eq!(store.stats().local_writes, 0);
}

#[test]
fn test_set_rejects_non_finite_float() {
    let store = offline_store();

    let result = store.set(EntityId(1), &health(), Some(ComponentValue::Float(f64::NAN)));

    assert!(matches!(result, Err(ReplicationError::TypeMismatch { .. })));
    assert!(store.get(EntityId(1)).is_empty());
}

#[test]
fn test_set_checks_registry_not_caller_descriptor() {
    let store = offline_store();
    let rogue = ComponentDescriptor::new("health", 1, ValueType::Text);

    let result = store.set(EntityId(7), &rogue, Some(ComponentValue::Text("oops".into())));

    assert!(matches!(
        result,
        Err(ReplicationError::TypeMismatch { component, .. }) if component == ComponentId(1)
    ));
    assert_eq!(store.get(EntityId(7)).get(ComponentId(1)), None);
    assert_eq!(store.stats().local_writes, 0);
}

#[test]
fn test_set_rejects_unregistered_component() {
    let store = offline_store();
    let unknown = ComponentDescriptor::new("mana", 9, ValueType::Float);

    let result = store.set(EntityId(7), &unknown, Some(ComponentValue::Float(1.0)));

    assert!(matches!(
        result,
        Err(ReplicationError::UnknownComponent(id)) if id == ComponentId(9)
    ));
    assert!(store.get(EntityId(7)).is_empty());
}

#[test]
fn test_set_rejects_null_document() {
    let store = offline_store();
    let doc = ComponentDescriptor::new("doc", 3, ValueType::Json);

    let result = store.set(
        EntityId(1),
        &doc,
        Some(ComponentValue::Json(serde_json::Value::Null)),
    );

    assert!(matches!(
        result,
        Err(ReplicationError::TypeMismatch {
            source: ValueError::NullDocument,
            ..
        })
    ));
    assert!(store.get(EntityId(1)).is_empty());
}

/// What the writer keeps locally is exactly what a peer decodes.
#[tokio::test]
async fn test_local_value_matches_what_peers_decode() {
    let (store, probe, _feed) = scripted_store(vec![]);
    store.connect().await.unwrap();
    let doc = ComponentDescriptor::new("doc", 3, ValueType::Json);
    let value = ComponentValue::Json(serde_json::json!({"stats": {"hp": 3}, "note": null}));

    store.set(EntityId(1), &doc, Some(value.clone())).unwrap();
    assert!(eventually(|| probe.accepted().len() == 1).await);

    let peer = EnvelopeCodec::new(REMOTE, registry());
    let decoded = peer.decode(&probe.accepted()[0]).unwrap();
    assert_eq!(decoded.value, store.get(EntityId(1)).get(ComponentId(3)));
    assert_eq!(decoded.value, Some(value));

    store.disconnect().await;
}

#[test]
fn test_set_none_removes() {
    let store = offline_store();
    store
        .set(EntityId(1), &health(), Some(ComponentValue::Float(1.0)))
        .unwrap();

    store.set(EntityId(1), &health(), None).unwrap();

    assert_eq!(store.get(EntityId(1)).get(ComponentId(1)), None);
}

#[test]
fn test_typed_set_and_get() {
    let store = offline_store();
    let name: ComponentKey<String> = ComponentKey::new("name", 2);

    store
        .set_typed(EntityId(3), &name, Some("goblin".to_string()))
        .unwrap();

    assert_eq!(store.get_typed(EntityId(3), &name), Some("goblin".to_string()));
}

#[test]
fn test_random_origin_when_unset() {
    let a = ReplicationStore::new(
        StoreConfig::default(),
        registry(),
        Arc::new(InMemoryTransport::new()),
    );
    let b = ReplicationStore::new(
        StoreConfig::default(),
        registry(),
        Arc::new(InMemoryTransport::new()),
    );

    assert_ne!(a.origin_id(), b.origin_id());
    assert_eq!(offline_store().origin_id(), LOCAL);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_connect_twice_fails() {
    let (store, _probe, _feed) = scripted_store(vec![]);

    store.connect().await.unwrap();
    assert_eq!(store.state(), StoreState::Connected);
    assert!(matches!(
        store.connect().await,
        Err(ReplicationError::AlreadyConnected)
    ));

    store.disconnect().await;
}

#[tokio::test]
async fn test_connect_failure_stays_disconnected() {
    let (publication, _probe) = ScriptedPublication::accepting();
    let (subscription, _feed) = ScriptedSubscription::new();
    let transport = ScriptedTransport::new(publication, subscription);
    transport.fail_with(TransportError::Unavailable("driver down".into()));
    let store = ReplicationStore::new(config(), registry(), Arc::new(transport));

    let result = store.connect().await;

    assert!(matches!(
        result,
        Err(ReplicationError::TransportUnavailable(_))
    ));
    assert_eq!(store.state(), StoreState::Disconnected);
}

#[tokio::test]
async fn test_set_while_connected_enqueues_in_order() {
    let (store, probe, _feed) = scripted_store(vec![OfferOutcome::BackPressured]);
    store.connect().await.unwrap();

    for value in [1.0, 2.0, 3.0] {
        let outcome = store
            .set(EntityId(7), &health(), Some(ComponentValue::Float(value)))
            .unwrap();
        assert_eq!(outcome, SetOutcome::Enqueued);
    }

    assert!(eventually(|| probe.accepted().len() == 3).await);
    let observer = EnvelopeCodec::new(OriginId(999), registry());
    let values: Vec<Option<ComponentValue>> = probe
        .accepted()
        .iter()
        .map(|bytes| observer.decode(bytes).unwrap().value)
        .collect();
    assert_eq!(
        values,
        vec![
            Some(ComponentValue::Float(1.0)),
            Some(ComponentValue::Float(2.0)),
            Some(ComponentValue::Float(3.0)),
        ]
    );
    assert_eq!(store.stats().envelopes_enqueued, 3);

    store.disconnect().await;
}

#[tokio::test]
async fn test_inbound_update_applied_without_rebroadcast() {
    let (store, probe, feed) = scripted_store(vec![]);
    store.connect().await.unwrap();

    feed.push_message(2, &wire(REMOTE, 7, 3.5));

    assert!(
        eventually(|| store.get(EntityId(7)).get(ComponentId(1))
            == Some(ComponentValue::Float(3.5)))
        .await
    );
    assert_eq!(store.stats().envelopes_applied, 1);
    assert_eq!(store.stats().envelopes_enqueued, 0);
    assert!(probe.attempts().is_empty());

    store.disconnect().await;
}

#[tokio::test]
async fn test_own_origin_inbound_ignored() {
    let (store, _probe, feed) = scripted_store(vec![]);
    store.connect().await.unwrap();
    store
        .set(EntityId(7), &health(), Some(ComponentValue::Float(1.0)))
        .unwrap();

    feed.push_message(2, &wire(LOCAL, 7, 99.0));

    assert!(eventually(|| store.stats().codec.self_origin == 1).await);
    assert_eq!(
        store.get(EntityId(7)).get(ComponentId(1)),
        Some(ComponentValue::Float(1.0))
    );
    assert_eq!(store.stats().envelopes_applied, 0);

    store.disconnect().await;
}

#[tokio::test]
async fn test_nothing_applied_after_disconnect() {
    let (store, probe, feed) = scripted_store(vec![]);
    store.connect().await.unwrap();
    store.disconnect().await;

    assert_eq!(store.state(), StoreState::Disconnected);
    assert!(probe.is_closed());
    assert!(feed.is_released());

    feed.push_message(2, &wire(REMOTE, 7, 3.5));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(store.get(EntityId(7)).get(ComponentId(1)), None);
    assert_eq!(store.stats().envelopes_applied, 0);
}

#[tokio::test]
async fn test_repeated_disconnect_is_noop() {
    let (store, _probe, _feed) = scripted_store(vec![]);
    store.disconnect().await;

    store.connect().await.unwrap();
    store.disconnect().await;
    store.disconnect().await;

    assert_eq!(store.state(), StoreState::Disconnected);
}

#[tokio::test]
async fn test_publication_closed_disconnects_store() {
    let (store, probe, _feed) = scripted_store(vec![OfferOutcome::Closed]);
    store.connect().await.unwrap();

    store
        .set(EntityId(1), &health(), Some(ComponentValue::Float(5.0)))
        .unwrap();

    assert!(eventually(|| store.state() == StoreState::Disconnected).await);
    assert!(probe.accepted().is_empty());

    let outcome = store
        .set(EntityId(1), &health(), Some(ComponentValue::Float(6.0)))
        .unwrap();
    assert_eq!(outcome, SetOutcome::LocalOnly);
    assert_eq!(
        store.get(EntityId(1)).get(ComponentId(1)),
        Some(ComponentValue::Float(6.0))
    );
}

#[tokio::test]
async fn test_subscription_closed_disconnects_store() {
    let (store, _probe, feed) = scripted_store(vec![]);
    store.connect().await.unwrap();

    feed.close_transport();

    assert!(eventually(|| store.state() == StoreState::Disconnected).await);
}

#[tokio::test]
async fn test_reconnect_after_disconnect() {
    let store = ReplicationStore::new(config(), registry(), Arc::new(InMemoryTransport::new()));

    store.connect().await.unwrap();
    store.disconnect().await;
    store.connect().await.unwrap();

    assert_eq!(store.state(), StoreState::Connected);
    store.disconnect().await;
}

#[tokio::test]
async fn test_stats_snapshot() {
    let (store, _probe, feed) = scripted_store(vec![]);
    store.connect().await.unwrap();

    feed.push_message(2, &wire(REMOTE, 1, 1.0));
    feed.push_message(2, b"garbage");

    assert!(
        eventually(|| {
            let codec = store.stats().codec;
            codec.decoded + codec.malformed == 2
        })
        .await
    );
    let stats = store.stats();
    assert_eq!(stats.origin_id, LOCAL);
    assert_eq!(stats.state, StoreState::Connected);
    assert_eq!(stats.codec.decoded, 1);
    assert_eq!(stats.codec.malformed, 1);
    assert_eq!(stats.envelopes_applied, 1);
    assert_eq!(stats.entities, 1);

    store.disconnect().await;
    assert_eq!(store.stats().bridge, LoopStats::default());
}
