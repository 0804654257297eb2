//! # Replication Between Workers
//!
//! Two stores attached to one in-memory transport, the way separate worker
//! processes share a channel in production.
//!
//! ## Flow Tested
//!
//! ```text
//! A.set() → queue → bridge(A) → transport → bridge(B) → codec(B) → entity(B)
//!                                   │
//!                                   └──→ bridge(A) → codec(A) → dropped (own origin)
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use er_02_envelope_codec::EnvelopeCodec;
    use er_03_transport_bridge::BridgeConfig;
    use er_04_replication_store::{ReplicationStore, SetOutcome, StoreState};
    use shared_bus::{InMemoryTransport, Subscription, Transport};
    use shared_types::{EntityId, OriginId, UpdateEnvelope};

    use crate::integration::fixtures::{eventually, registry, speed, store, tag, ORIGIN_A, ORIGIN_B};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn connected_pair() -> (Arc<InMemoryTransport>, ReplicationStore, ReplicationStore) {
        let transport = Arc::new(InMemoryTransport::new());
        let a = store(ORIGIN_A, transport.clone());
        let b = store(ORIGIN_B, transport.clone());
        a.connect().await.unwrap();
        b.connect().await.unwrap();
        (transport, a, b)
    }

    /// Raw subscription on the stores' stream, for observing the wire.
    fn wiretap(transport: &InMemoryTransport) -> Box<dyn Subscription> {
        let config = BridgeConfig::default();
        transport
            .add_subscription(&config.channel, config.stream_id)
            .unwrap()
    }

    /// Decode everything the wiretap has buffered.
    fn drain(tap: &mut Box<dyn Subscription>) -> Vec<UpdateEnvelope> {
        let observer = EnvelopeCodec::new(OriginId(999), registry());
        let mut seen = Vec::new();
        loop {
            let batch = tap.poll(64).unwrap();
            if batch.is_empty() {
                return seen;
            }
            seen.extend(batch.iter().filter_map(|f| observer.decode(&f.payload)));
        }
    }

    // =============================================================================
    // TWO WORKERS
    // =============================================================================

    /// A's write shows up on B; A neither re-applies nor rebroadcasts it.
    #[tokio::test]
    async fn test_write_on_a_is_reflected_on_b() {
        let (transport, a, b) = connected_pair().await;
        let mut tap = wiretap(&transport);

        let outcome = a.set_typed(EntityId(7), &speed(), Some(3.5)).unwrap();
        assert_eq!(outcome, SetOutcome::Enqueued);

        assert!(eventually(|| b.get_typed(EntityId(7), &speed()) == Some(3.5)).await);
        assert!(eventually(|| a.stats().codec.self_origin == 1).await);

        // Give B time to (wrongly) publish anything of its own.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let on_wire = drain(&mut tap);
        assert_eq!(on_wire.len(), 1);
        assert_eq!(on_wire[0].origin_id, ORIGIN_A);

        assert_eq!(a.stats().envelopes_applied, 0);
        assert_eq!(b.stats().envelopes_applied, 1);
        assert_eq!(b.stats().envelopes_enqueued, 0);

        a.disconnect().await;
        b.disconnect().await;
    }

    #[tokio::test]
    async fn test_removal_replicates() {
        let (_transport, a, b) = connected_pair().await;

        a.set_typed(EntityId(3), &tag(), Some("scout".to_string()))
            .unwrap();
        assert!(eventually(|| b.get(EntityId(3)).contains(tag().id())).await);

        a.set_typed::<String>(EntityId(3), &tag(), None).unwrap();
        assert!(eventually(|| !b.get(EntityId(3)).contains(tag().id())).await);

        a.disconnect().await;
        b.disconnect().await;
    }

    /// Later writes to the same component win on the receiver.
    #[tokio::test]
    async fn test_single_origin_order_preserved() {
        let (_transport, a, b) = connected_pair().await;

        for i in 1..=50 {
            a.set_typed(EntityId(1), &speed(), Some(f64::from(i))).unwrap();
        }

        assert!(eventually(|| b.stats().envelopes_applied == 50).await);
        assert_eq!(b.get_typed(EntityId(1), &speed()), Some(50.0));

        a.disconnect().await;
        b.disconnect().await;
    }

    #[tokio::test]
    async fn test_both_directions() {
        let (_transport, a, b) = connected_pair().await;

        a.set_typed(EntityId(1), &speed(), Some(1.0)).unwrap();
        b.set_typed(EntityId(2), &speed(), Some(2.0)).unwrap();

        assert!(eventually(|| a.get_typed(EntityId(2), &speed()) == Some(2.0)).await);
        assert!(eventually(|| b.get_typed(EntityId(1), &speed()) == Some(1.0)).await);

        a.disconnect().await;
        b.disconnect().await;
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_nothing_applied_after_disconnect() {
        let (_transport, a, b) = connected_pair().await;

        b.disconnect().await;
        b.disconnect().await;
        assert_eq!(b.state(), StoreState::Disconnected);

        a.set_typed(EntityId(9), &speed(), Some(9.0)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(b.get_typed(EntityId(9), &speed()), None);
        assert_eq!(b.stats().envelopes_applied, 0);

        a.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnected_writer_stays_local() {
        let transport = Arc::new(InMemoryTransport::new());
        let a = store(ORIGIN_A, transport.clone());
        let b = store(ORIGIN_B, transport.clone());
        b.connect().await.unwrap();

        let outcome = a.set_typed(EntityId(4), &speed(), Some(4.0)).unwrap();
        assert_eq!(outcome, SetOutcome::LocalOnly);
        assert_eq!(a.get_typed(EntityId(4), &speed()), Some(4.0));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(b.get_typed(EntityId(4), &speed()), None);

        b.disconnect().await;
    }

    /// Updates published while a worker was away are not replayed.
    #[tokio::test]
    async fn test_reconnect_sees_only_new_updates() {
        let (_transport, a, b) = connected_pair().await;

        b.disconnect().await;
        a.set_typed(EntityId(1), &speed(), Some(1.0)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        b.connect().await.unwrap();
        a.set_typed(EntityId(2), &speed(), Some(2.0)).unwrap();

        assert!(eventually(|| b.get_typed(EntityId(2), &speed()) == Some(2.0)).await);
        assert_eq!(b.get_typed(EntityId(1), &speed()), None);

        a.disconnect().await;
        b.disconnect().await;
    }
}
