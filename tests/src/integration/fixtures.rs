//! Shared test fixtures.

use std::sync::Arc;
use std::time::Duration;

use er_01_component_registry::{ComponentKey, ComponentRegistry};
use er_04_replication_store::{ReplicationStore, StoreConfig};
use shared_bus::Transport;
use shared_types::OriginId;

/// Origin of the writing worker.
pub const ORIGIN_A: OriginId = OriginId(100);

/// Origin of the reading worker.
pub const ORIGIN_B: OriginId = OriginId(200);

/// Upper bound on any eventual-consistency wait.
pub const WAIT: Duration = Duration::from_secs(2);

/// Float component with id 1.
pub fn speed() -> ComponentKey<f64> {
    ComponentKey::new("speed", 1)
}

/// Text component with id 2.
pub fn tag() -> ComponentKey<String> {
    ComponentKey::new("tag", 2)
}

/// Registry every worker in these scenarios shares.
pub fn registry() -> Arc<ComponentRegistry> {
    let registry = ComponentRegistry::new();
    registry.register_key(&speed());
    registry.register_key(&tag());
    Arc::new(registry)
}

/// A disconnected store with a fixed origin.
pub fn store(origin: OriginId, transport: Arc<dyn Transport>) -> ReplicationStore {
    ReplicationStore::new(
        StoreConfig::default().with_origin(origin),
        registry(),
        transport,
    )
}

/// Poll `check` until it holds or [`WAIT`] elapses.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    check()
}
