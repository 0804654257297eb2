//! Prometheus metrics for Entity Relay.
//!
//! All metrics follow the naming convention: `er_<component>_<metric>`
//! and carry an `origin` label (the store's origin id in hex).
//!
//! Store, codec and bridge counters live in the subsystems themselves;
//! [`record_store_stats`] copies a snapshot into gauges here, so every value
//! is exported as a gauge.

use er_04_replication_store::{StoreState, StoreStats};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // STORE METRICS (Subsystem 4)
    // =========================================================================

    /// 1 while the store has a live transport session
    pub static ref STORE_CONNECTED: IntGaugeVec = gauge(
        "er_store_connected",
        "Whether the replication store is connected",
        &["origin"]
    );

    /// Entities created
    pub static ref STORE_ENTITIES: IntGaugeVec = gauge(
        "er_store_entities",
        "Number of entities in the store",
        &["origin"]
    );

    /// Local component writes
    pub static ref STORE_LOCAL_WRITES: IntGaugeVec = gauge(
        "er_store_local_writes",
        "Component writes made through set()",
        &["origin"]
    );

    /// Envelopes queued for publication
    pub static ref STORE_ENVELOPES_ENQUEUED: IntGaugeVec = gauge(
        "er_store_envelopes_enqueued",
        "Envelopes handed to the outbound queue",
        &["origin"]
    );

    /// Remote envelopes loaded into entities
    pub static ref STORE_ENVELOPES_APPLIED: IntGaugeVec = gauge(
        "er_store_envelopes_applied",
        "Inbound envelopes applied to local entities",
        &["origin"]
    );

    // =========================================================================
    // CODEC METRICS (Subsystem 2)
    // =========================================================================

    /// Inbound envelopes accepted by the codec
    pub static ref CODEC_DECODED: IntGaugeVec = gauge(
        "er_codec_decoded",
        "Inbound envelopes accepted for application",
        &["origin"]
    );

    /// Inbound envelopes discarded, by reason
    pub static ref CODEC_DROPPED: IntGaugeVec = gauge(
        "er_codec_dropped",
        "Inbound envelopes discarded by the codec",
        &["origin", "reason"]  // reason: malformed/unknown_component/self_origin/type_mismatch
    );

    // =========================================================================
    // BRIDGE METRICS (Subsystem 3)
    // =========================================================================

    /// Messages accepted by the publication
    pub static ref BRIDGE_MESSAGES_SENT: IntGaugeVec = gauge(
        "er_bridge_messages_sent",
        "Messages accepted by the transport in the current session",
        &["origin"]
    );

    /// Complete messages received
    pub static ref BRIDGE_MESSAGES_RECEIVED: IntGaugeVec = gauge(
        "er_bridge_messages_received",
        "Messages received from the transport in the current session",
        &["origin"]
    );

    /// Offers retried after backpressure
    pub static ref BRIDGE_BACKPRESSURE_RETRIES: IntGaugeVec = gauge(
        "er_bridge_backpressure_retries",
        "Offers retried after a retryable outcome in the current session",
        &["origin"]
    );

    /// Fragments dropped by reassembly
    pub static ref BRIDGE_DROPPED_FRAGMENTS: IntGaugeVec = gauge(
        "er_bridge_dropped_fragments",
        "Fragments discarded by reassembly in the current session",
        &["origin"]
    );

    static ref REGISTERED: Result<(), String> = register_all();
}

fn gauge(name: &str, help: &str, labels: &[&str]) -> IntGaugeVec {
    IntGaugeVec::new(Opts::new(name, help), labels).expect("metric creation failed")
}

fn register_all() -> Result<(), String> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Store
        Box::new(STORE_CONNECTED.clone()),
        Box::new(STORE_ENTITIES.clone()),
        Box::new(STORE_LOCAL_WRITES.clone()),
        Box::new(STORE_ENVELOPES_ENQUEUED.clone()),
        Box::new(STORE_ENVELOPES_APPLIED.clone()),
        // Codec
        Box::new(CODEC_DECODED.clone()),
        Box::new(CODEC_DROPPED.clone()),
        // Bridge
        Box::new(BRIDGE_MESSAGES_SENT.clone()),
        Box::new(BRIDGE_MESSAGES_RECEIVED.clone()),
        Box::new(BRIDGE_BACKPRESSURE_RETRIES.clone()),
        Box::new(BRIDGE_DROPPED_FRAGMENTS.clone()),
    ];

    for metric in metrics {
        REGISTRY.register(metric).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Register all metrics with the global registry. Idempotent.
///
/// # Errors
///
/// - `TelemetryError::MetricsInit` - A metric could not be registered.
pub fn register_metrics() -> Result<(), TelemetryError> {
    REGISTERED.clone().map_err(TelemetryError::MetricsInit)
}

fn to_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Publish a store snapshot.
pub fn record_store_stats(stats: &StoreStats) {
    let origin = stats.origin_id.to_string();
    let origin = origin.as_str();

    STORE_CONNECTED
        .with_label_values(&[origin])
        .set(i64::from(stats.state == StoreState::Connected));
    STORE_ENTITIES
        .with_label_values(&[origin])
        .set(to_gauge(stats.entities as u64));
    STORE_LOCAL_WRITES
        .with_label_values(&[origin])
        .set(to_gauge(stats.local_writes));
    STORE_ENVELOPES_ENQUEUED
        .with_label_values(&[origin])
        .set(to_gauge(stats.envelopes_enqueued));
    STORE_ENVELOPES_APPLIED
        .with_label_values(&[origin])
        .set(to_gauge(stats.envelopes_applied));

    let codec = &stats.codec;
    CODEC_DECODED
        .with_label_values(&[origin])
        .set(to_gauge(codec.decoded));
    for (reason, value) in [
        ("malformed", codec.malformed),
        ("unknown_component", codec.unknown_component),
        ("self_origin", codec.self_origin),
        ("type_mismatch", codec.type_mismatch),
    ] {
        CODEC_DROPPED
            .with_label_values(&[origin, reason])
            .set(to_gauge(value));
    }

    let bridge = &stats.bridge;
    BRIDGE_MESSAGES_SENT
        .with_label_values(&[origin])
        .set(to_gauge(bridge.messages_sent));
    BRIDGE_MESSAGES_RECEIVED
        .with_label_values(&[origin])
        .set(to_gauge(bridge.messages_received));
    BRIDGE_BACKPRESSURE_RETRIES
        .with_label_values(&[origin])
        .set(to_gauge(bridge.backpressure_retries));
    BRIDGE_DROPPED_FRAGMENTS
        .with_label_values(&[origin])
        .set(to_gauge(bridge.dropped_fragments));
}

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// - `TelemetryError::MetricsInit` - Encoding failed.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
