//! # Session Lifecycle
//!
//! `connect()` / `disconnect()` and the background tasks of a live session:
//!
//! - **apply task** - decodes inbound bytes and loads them into entities
//! - **monitor** - waits for the bridge fault and disconnects the store

use super::{ReplicationStore, StoreInner};
use crate::adapters::EncodingSource;
use crate::domain::{ReplicationError, StoreState};
use er_03_transport_bridge::{BridgeHandle, BridgeReport, LoopStats, TransportBridge};
use shared_types::UpdateEnvelope;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) enum Lifecycle {
    Disconnected,
    Connected(Session),
}

/// Everything owned by one live transport session.
pub(crate) struct Session {
    epoch: u64,
    outbound: mpsc::UnboundedSender<UpdateEnvelope>,
    bridge: BridgeHandle,
    apply_task: JoinHandle<()>,
    monitor: Option<JoinHandle<()>>,
}

impl Lifecycle {
    pub(crate) fn state(&self) -> StoreState {
        match self {
            Lifecycle::Disconnected => StoreState::Disconnected,
            Lifecycle::Connected(_) => StoreState::Connected,
        }
    }

    /// Queue an envelope on the live session. Returns false when there is
    /// none or its outbound loop has stopped.
    pub(crate) fn enqueue(&self, envelope: UpdateEnvelope) -> bool {
        match self {
            Lifecycle::Connected(session) => session.outbound.send(envelope).is_ok(),
            Lifecycle::Disconnected => false,
        }
    }

    pub(crate) fn bridge_stats(&self) -> Option<LoopStats> {
        match self {
            Lifecycle::Connected(session) => Some(session.bridge.stats()),
            Lifecycle::Disconnected => None,
        }
    }
}

impl Session {
    /// Stop applying, stop both loops and release the transport handles.
    async fn close(self) -> BridgeReport {
        let Session {
            outbound,
            bridge,
            apply_task,
            monitor,
            ..
        } = self;

        if let Some(monitor) = monitor {
            monitor.abort();
        }
        apply_task.abort();
        drop(outbound);

        let report = bridge.shutdown().await;
        // Cancelled is the expected outcome here.
        let _ = apply_task.await;
        report
    }
}

impl ReplicationStore {
    /// Open a transport session and start replicating.
    ///
    /// The store is `Connected` once this returns `Ok`. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `ReplicationError::AlreadyConnected` - A session is already live.
    /// - `ReplicationError::TransportUnavailable` - The transport refused the
    ///   session. The store stays `Disconnected`.
    pub async fn connect(&self) -> Result<(), ReplicationError> {
        let inner = &self.inner;
        let mut lifecycle = inner.lifecycle.lock();
        if let Lifecycle::Connected(_) = *lifecycle {
            return Err(ReplicationError::AlreadyConnected);
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let source = EncodingSource::new(outbound_rx, Arc::clone(&inner.codec));

        let bridge = TransportBridge::new(inner.config.bridge.clone())
            .start(inner.transport.as_ref(), source, inbound_tx)
            .map_err(|e| {
                warn!(origin = %inner.origin_id, error = %e, "Replication store failed to connect");
                ReplicationError::TransportUnavailable(e)
            })?;

        let epoch = inner.sessions_started.fetch_add(1, Ordering::Relaxed) + 1;
        let apply_task = tokio::spawn(apply_inbound(Arc::downgrade(inner), inbound_rx));
        let monitor = tokio::spawn(watch_transport(
            Arc::downgrade(inner),
            bridge.fault(),
            epoch,
        ));

        *lifecycle = Lifecycle::Connected(Session {
            epoch,
            outbound: outbound_tx,
            bridge,
            apply_task,
            monitor: Some(monitor),
        });

        info!(
            origin = %inner.origin_id,
            channel = %inner.config.bridge.channel,
            stream_id = inner.config.bridge.stream_id,
            session = epoch,
            "Replication store connected"
        );
        Ok(())
    }

    /// Stop replicating and release the transport session.
    ///
    /// Returns once both bridge loops have stopped; nothing is applied
    /// afterwards. A no-op when already disconnected.
    pub async fn disconnect(&self) {
        let Some(session) = self.inner.take_session(None) else {
            debug!(origin = %self.inner.origin_id, "Replication store already disconnected");
            return;
        };

        info!(origin = %self.inner.origin_id, "Disconnecting replication store");
        let report = session.close().await;
        info!(
            origin = %self.inner.origin_id,
            outbound = ?report.outbound,
            inbound = ?report.inbound,
            sent = report.stats.messages_sent,
            received = report.stats.messages_received,
            "Replication store disconnected"
        );
    }
}

impl StoreInner {
    /// Take the live session, optionally only if it is session `epoch`.
    fn take_session(&self, epoch: Option<u64>) -> Option<Session> {
        let mut lifecycle = self.lifecycle.lock();
        match &*lifecycle {
            Lifecycle::Connected(session) if epoch.map_or(true, |e| e == session.epoch) => {}
            _ => return None,
        }
        match std::mem::replace(&mut *lifecycle, Lifecycle::Disconnected) {
            Lifecycle::Connected(session) => Some(session),
            Lifecycle::Disconnected => None,
        }
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Lifecycle::Connected(session) = self.lifecycle.get_mut() {
            session.apply_task.abort();
            if let Some(monitor) = session.monitor.take() {
                monitor.abort();
            }
        }
    }
}

async fn apply_inbound(inner: Weak<StoreInner>, mut inbound: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = inbound.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.apply(&bytes);
    }
}

async fn watch_transport(
    inner: Weak<StoreInner>,
    fault: impl Future<Output = ()> + Send,
    epoch: u64,
) {
    fault.await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Some(mut session) = inner.take_session(Some(epoch)) else {
        return;
    };
    warn!(
        origin = %inner.origin_id,
        session = epoch,
        "Transport closed, replication store disconnected"
    );

    // This task is the monitor; detach its own handle.
    drop(session.monitor.take());
    let report = session.close().await;
    debug!(
        outbound = ?report.outbound,
        inbound = ?report.inbound,
        "Closed session after transport fault"
    );
}
