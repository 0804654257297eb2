//! # Transport Faults
//!
//! Backpressure, closure and garbage on the wire, observed from the store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use er_02_envelope_codec::EnvelopeCodec;
    use er_03_transport_bridge::testing::{
        ScriptedPublication, ScriptedSubscription, ScriptedTransport,
    };
    use er_03_transport_bridge::BridgeConfig;
    use er_04_replication_store::{SetOutcome, StoreState};
    use shared_bus::{InMemoryTransport, OfferOutcome, Publication, Transport};
    use shared_types::{ComponentValue, EntityId, OriginId, UpdateEnvelope};

    use crate::integration::fixtures::{eventually, registry, speed, store, ORIGIN_A, ORIGIN_B};

    // =============================================================================
    // OUTBOUND
    // =============================================================================

    /// Three refusals then success: the fourth offer carries the same bytes.
    #[tokio::test]
    async fn test_backpressure_then_success() {
        let (publication, probe) = ScriptedPublication::new(vec![
            OfferOutcome::BackPressured,
            OfferOutcome::BackPressured,
            OfferOutcome::BackPressured,
        ]);
        let (subscription, _feed) = ScriptedSubscription::new();
        let a = store(
            ORIGIN_A,
            Arc::new(ScriptedTransport::new(publication, subscription)),
        );
        a.connect().await.unwrap();

        a.set_typed(EntityId(7), &speed(), Some(3.5)).unwrap();
        assert!(eventually(|| probe.accepted().len() == 1).await);

        let attempts = probe.attempts();
        assert_eq!(attempts.len(), 4);
        assert!(attempts.iter().all(|bytes| *bytes == attempts[0]));

        let decoded = EnvelopeCodec::new(ORIGIN_B, registry())
            .decode(&probe.accepted()[0])
            .unwrap();
        assert_eq!(
            decoded,
            UpdateEnvelope::set(
                ORIGIN_A,
                EntityId(7),
                speed().id(),
                ComponentValue::Float(3.5)
            )
        );

        assert_eq!(a.stats().bridge.backpressure_retries, 3);
        assert_eq!(a.stats().bridge.messages_sent, 1);

        a.disconnect().await;
        assert!(probe.is_closed());
    }

    /// A closed publication ends the session; later writes stay local.
    #[tokio::test]
    async fn test_closed_publication_disconnects_store() {
        let (publication, _probe) = ScriptedPublication::new(vec![OfferOutcome::Closed]);
        let (subscription, _feed) = ScriptedSubscription::new();
        let a = store(
            ORIGIN_A,
            Arc::new(ScriptedTransport::new(publication, subscription)),
        );
        a.connect().await.unwrap();

        assert_eq!(
            a.set_typed(EntityId(1), &speed(), Some(1.0)).unwrap(),
            SetOutcome::Enqueued
        );
        assert!(eventually(|| a.state() == StoreState::Disconnected).await);

        assert_eq!(
            a.set_typed(EntityId(1), &speed(), Some(2.0)).unwrap(),
            SetOutcome::LocalOnly
        );
        assert_eq!(a.get_typed(EntityId(1), &speed()), Some(2.0));
    }

    #[tokio::test]
    async fn test_transport_shutdown_disconnects_everyone() {
        let transport = Arc::new(InMemoryTransport::new());
        let a = store(ORIGIN_A, transport.clone());
        let b = store(ORIGIN_B, transport.clone());
        a.connect().await.unwrap();
        b.connect().await.unwrap();

        transport.close();

        assert!(eventually(|| a.state() == StoreState::Disconnected).await);
        assert!(eventually(|| b.state() == StoreState::Disconnected).await);
        assert!(a.connect().await.is_err());
    }

    // =============================================================================
    // INBOUND
    // =============================================================================

    /// Garbage, unknown components and mistyped values are dropped; a valid
    /// envelope sent after them still lands.
    #[tokio::test]
    async fn test_bad_envelopes_do_not_corrupt_state() {
        let transport = Arc::new(InMemoryTransport::new());
        let b = store(ORIGIN_B, transport.clone());
        b.connect().await.unwrap();

        let config = BridgeConfig::default();
        let mut rogue = transport
            .add_publication(&config.channel, config.stream_id)
            .unwrap();

        let valid = EnvelopeCodec::new(OriginId(300), registry())
            .encode(&UpdateEnvelope::set(
                OriginId(300),
                EntityId(5),
                speed().id(),
                ComponentValue::Float(5.5),
            ))
            .unwrap();
        let messages: [&[u8]; 5] = [
            b"not json",
            br#"{"originId":300,"entityId":5}"#,
            br#"{"originId":300,"entityId":5,"componentId":99,"value":1}"#,
            br#"{"originId":300,"entityId":5,"componentId":1,"value":"fast"}"#,
            &valid,
        ];
        for message in messages {
            assert_eq!(rogue.offer(message), OfferOutcome::Accepted);
        }

        assert!(eventually(|| b.get_typed(EntityId(5), &speed()) == Some(5.5)).await);

        let codec = b.stats().codec;
        assert_eq!(codec.malformed, 2);
        assert_eq!(codec.unknown_component, 1);
        assert_eq!(codec.type_mismatch, 1);
        assert_eq!(b.stats().envelopes_applied, 1);

        rogue.close();
        b.disconnect().await;
    }

    #[tokio::test]
    async fn test_own_origin_from_another_process_is_ignored() {
        let transport = Arc::new(InMemoryTransport::new());
        let b = store(ORIGIN_B, transport.clone());
        b.connect().await.unwrap();

        let config = BridgeConfig::default();
        let mut impostor = transport
            .add_publication(&config.channel, config.stream_id)
            .unwrap();
        let echoed = EnvelopeCodec::new(ORIGIN_B, registry())
            .encode(&UpdateEnvelope::set(
                ORIGIN_B,
                EntityId(1),
                speed().id(),
                ComponentValue::Float(1.0),
            ))
            .unwrap();
        impostor.offer(&echoed);

        assert!(eventually(|| b.stats().codec.self_origin == 1).await);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(b.get_typed(EntityId(1), &speed()), None);

        impostor.close();
        b.disconnect().await;
    }
}
