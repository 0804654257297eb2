//! # Value Objects

use er_02_envelope_codec::CodecStatsSnapshot;
use er_03_transport_bridge::{BridgeConfig, LoopStats};
use shared_types::OriginId;

/// Replication store configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Fixed origin id. A random one is drawn when `None`.
    pub origin_id: Option<OriginId>,
    /// Transport address and loop tuning.
    pub bridge: BridgeConfig,
}

impl StoreConfig {
    pub fn with_origin(mut self, origin_id: OriginId) -> Self {
        self.origin_id = Some(origin_id);
        self
    }
}

/// Transport session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Disconnected,
    Connected,
}

/// Result of a successful `set()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written locally and queued for replication.
    Enqueued,
    /// Written locally only; no session was live.
    LocalOnly,
}

/// Snapshot of store activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub origin_id: OriginId,
    pub state: StoreState,
    pub entities: usize,
    /// Successful `set()` calls.
    pub local_writes: u64,
    /// Envelopes handed to the outbound queue.
    pub envelopes_enqueued: u64,
    /// Inbound envelopes loaded into entities.
    pub envelopes_applied: u64,
    pub codec: CodecStatsSnapshot,
    /// Loop counters of the live session; zero when disconnected.
    pub bridge: LoopStats,
}
