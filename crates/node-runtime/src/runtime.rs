//! # Relay Node
//!
//! Two workers ("A" and "B"), each with its own replication store, attached
//! to one in-memory transport. Worker A writes components; worker B picks
//! them up through the bridge.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──→ start() ──→ run_demo() ──→ shutdown()
//!            │                            │
//!            ├─ connect A, connect B      ├─ signal reporter
//!            └─ spawn metrics reporter    └─ disconnect A, disconnect B
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use er_04_replication_store::{ReplicationStore, StoreStats};
use shared_bus::{InMemoryTransport, Transport};
use shared_types::EntityId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::components;
use crate::config::NodeConfig;

/// How often the reporter publishes store statistics as metrics.
const METRICS_INTERVAL: Duration = Duration::from_millis(500);

/// Polling period while waiting for worker B to catch up.
const CONVERGE_POLL: Duration = Duration::from_millis(2);

/// Outcome of one demo run.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Component writes made on worker A.
    pub writes: u64,
    /// Whether every write was visible on worker B before the timeout.
    pub converged: bool,
    pub worker_a: StoreStats,
    pub worker_b: StoreStats,
}

/// The demo node runtime.
pub struct RelayNode {
    config: NodeConfig,
    transport: Arc<InMemoryTransport>,
    worker_a: ReplicationStore,
    worker_b: ReplicationStore,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    reporter: Option<JoinHandle<()>>,
}

impl RelayNode {
    /// Create both workers on a fresh transport. Nothing is connected yet.
    pub fn new(config: NodeConfig) -> Self {
        info!(
            channel = %config.bridge.channel,
            stream_id = config.bridge.stream_id,
            "Creating Entity Relay node"
        );

        let registry = components::registry();
        let transport = Arc::new(InMemoryTransport::new());
        let shared: Arc<dyn Transport> = transport.clone();

        let worker_a = ReplicationStore::new(
            config.store_config(config.origin_a),
            registry.clone(),
            shared.clone(),
        );
        let worker_b = ReplicationStore::new(config.store_config(config.origin_b), registry, shared);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            transport,
            worker_a,
            worker_b,
            shutdown_tx,
            shutdown_rx,
            reporter: None,
        }
    }

    pub fn worker_a(&self) -> &ReplicationStore {
        &self.worker_a
    }

    pub fn worker_b(&self) -> &ReplicationStore {
        &self.worker_b
    }

    /// Connect both workers and start the metrics reporter.
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot open its transport session.
    pub async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  Entity Relay Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if self.worker_a.origin_id() == self.worker_b.origin_id() {
            anyhow::bail!(
                "workers drew the same origin id {}",
                self.worker_a.origin_id()
            );
        }

        self.worker_a
            .connect()
            .await
            .context("Failed to connect worker A")?;
        self.worker_b
            .connect()
            .await
            .context("Failed to connect worker B")?;

        self.reporter = Some(self.spawn_reporter());

        info!(
            worker_a = %self.worker_a.origin_id(),
            worker_b = %self.worker_b.origin_id(),
            "Workers connected"
        );
        Ok(())
    }

    fn spawn_reporter(&self) -> JoinHandle<()> {
        let stores = [self.worker_a.clone(), self.worker_b.clone()];
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        for store in &stores {
                            relay_telemetry::record_store_stats(&store.stats());
                        }
                    }
                    _ = shutdown.changed() => {
                        debug!("Metrics reporter shutdown signal received");
                        break;
                    }
                }
            }
        })
    }

    /// Write `demo_updates` rounds of components on worker A and wait for
    /// worker B to reflect them.
    ///
    /// # Errors
    ///
    /// Returns an error if a write is rejected.
    pub async fn run_demo(&self) -> Result<DemoReport> {
        let position = components::position_x();
        let health = components::health();
        let label = components::label();

        let mut writes = 0u64;
        for round in 0..self.config.demo_updates {
            let entity = EntityId(round % 4 + 1);
            self.worker_a
                .set_typed(entity, &position, Some(f64::from(round) * 1.5))
                .context("position write rejected")?;
            self.worker_a
                .set_typed(entity, &health, Some(100 - i64::from(round)))
                .context("health write rejected")?;
            self.worker_a
                .set_typed(entity, &label, Some(format!("entity-{entity}")))
                .context("label write rejected")?;
            writes += 3;
        }
        info!(writes, "Worker A finished writing");

        let converged = tokio::time::timeout(self.config.converge_timeout, async {
            while !self.in_sync(writes) {
                tokio::time::sleep(CONVERGE_POLL).await;
            }
        })
        .await
        .is_ok();

        if converged {
            info!(entities = self.worker_b.entity_count(), "Worker B converged");
        } else {
            warn!(
                timeout_ms = self.config.converge_timeout.as_millis() as u64,
                applied = self.worker_b.stats().envelopes_applied,
                "Worker B did not converge in time"
            );
        }

        Ok(DemoReport {
            writes,
            converged,
            worker_a: self.worker_a.stats(),
            worker_b: self.worker_b.stats(),
        })
    }

    /// Every write applied on B and every entity of A matching on B.
    fn in_sync(&self, writes: u64) -> bool {
        if self.worker_b.stats().envelopes_applied < writes {
            return false;
        }
        let position = components::position_x();
        let health = components::health();
        let label = components::label();

        (1..=self.config.demo_updates.min(4)).all(|id| {
            let entity = EntityId(id);
            self.worker_a.get_typed(entity, &position) == self.worker_b.get_typed(entity, &position)
                && self.worker_a.get_typed(entity, &health)
                    == self.worker_b.get_typed(entity, &health)
                && self.worker_a.get_typed(entity, &label) == self.worker_b.get_typed(entity, &label)
        })
    }

    /// Shut the node down gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal the reporter
    /// 2. Disconnect both workers (awaits their bridge loops)
    /// 3. Publish final statistics and close the transport
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        if let Some(reporter) = self.reporter.take() {
            if let Err(e) = reporter.await {
                warn!(error = %e, "Metrics reporter ended abnormally");
            }
        }

        self.worker_a.disconnect().await;
        self.worker_b.disconnect().await;

        relay_telemetry::record_store_stats(&self.worker_a.stats());
        relay_telemetry::record_store_stats(&self.worker_b.stats());
        self.transport.close();

        info!("Shutdown complete");
    }
}
