//! # Transport Bridge Service
//!
//! Opens the transport handles, spawns both loops and hands back a
//! [`BridgeHandle`] that owns them.

mod inbound;
mod outbound;


use crate::domain::{BridgeConfig, BridgeError, BridgeReport, LoopCounters, LoopExit, LoopStats};
use crate::ports::outbound::OutboundSource;
use shared_bus::Transport;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub(crate) use inbound::run_inbound;
pub(crate) use outbound::run_outbound;

/// Starts bridges for one `(channel, stream_id)`.
#[derive(Debug, Clone)]
pub struct TransportBridge {
    config: BridgeConfig,
}

impl TransportBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Open a publication and a subscription and spawn both loops.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `BridgeError::InvalidConfig` - See [`BridgeConfig::validate`].
    /// - `BridgeError::Transport` - The transport refused either handle. No
    ///   handle is left open.
    pub fn start<S>(
        &self,
        transport: &dyn Transport,
        source: S,
        sink: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<BridgeHandle, BridgeError>
    where
        S: OutboundSource + 'static,
    {
        let config = &self.config;
        config.validate()?;

        let mut publication = transport.add_publication(&config.channel, config.stream_id)?;
        let subscription = match transport.add_subscription(&config.channel, config.stream_id) {
            Ok(subscription) => subscription,
            Err(e) => {
                publication.close();
                return Err(e.into());
            }
        };
        let session_id = publication.session_id();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (fault_tx, fault_rx) = watch::channel(false);
        let fault_tx = Arc::new(fault_tx);
        let counters = Arc::new(LoopCounters::default());

        let outbound = {
            let fault_tx = Arc::clone(&fault_tx);
            let fut = run_outbound(
                publication,
                source,
                config.buffer_size_bytes,
                config.idle.clone(),
                shutdown_rx.clone(),
                Arc::clone(&counters),
            );
            tokio::spawn(async move {
                let exit = fut.await;
                raise_fault_on_close(&fault_tx, exit);
                exit
            })
        };

        let inbound = {
            let fut = run_inbound(
                subscription,
                sink,
                config.fragment_limit,
                config.idle.clone(),
                shutdown_rx,
                Arc::clone(&counters),
            );
            tokio::spawn(async move {
                let exit = fut.await;
                raise_fault_on_close(&fault_tx, exit);
                exit
            })
        };

        info!(
            channel = %config.channel,
            stream_id = config.stream_id,
            session_id,
            "Transport bridge started"
        );

        Ok(BridgeHandle {
            shutdown_tx,
            fault_rx,
            outbound,
            inbound,
            counters,
        })
    }
}

fn raise_fault_on_close(fault_tx: &watch::Sender<bool>, exit: LoopExit) {
    if exit == LoopExit::TransportClosed {
        fault_tx.send_replace(true);
    }
}

/// Owner of a running bridge.
///
/// Dropping the handle signals shutdown without waiting for the loops.
pub struct BridgeHandle {
    shutdown_tx: watch::Sender<bool>,
    fault_rx: watch::Receiver<bool>,
    outbound: JoinHandle<LoopExit>,
    inbound: JoinHandle<LoopExit>,
    counters: Arc<LoopCounters>,
}

impl BridgeHandle {
    /// Signal shutdown once and wait for both loops to stop.
    ///
    /// Loops notice the signal within one park period.
    pub async fn shutdown(self) -> BridgeReport {
        self.shutdown_tx.send_replace(true);

        let outbound = join_loop("outbound", self.outbound).await;
        let inbound = join_loop("inbound", self.inbound).await;
        let stats = self.counters.snapshot();

        info!(
            ?outbound,
            ?inbound,
            sent = stats.messages_sent,
            received = stats.messages_received,
            "Transport bridge stopped"
        );

        BridgeReport {
            outbound,
            inbound,
            stats,
        }
    }

    /// Resolves once either loop exits with `LoopExit::TransportClosed`.
    ///
    /// Never resolves if both loops stop for any other reason.
    pub fn fault(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut fault_rx = self.fault_rx.clone();
        async move {
            loop {
                if *fault_rx.borrow_and_update() {
                    return;
                }
                if fault_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    /// Returns true once the transport closed underneath the bridge.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        *self.fault_rx.borrow()
    }

    /// Returns true once both loops have stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outbound.is_finished() && self.inbound.is_finished()
    }

    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.counters.snapshot()
    }
}

async fn join_loop(name: &'static str, handle: JoinHandle<LoopExit>) -> LoopExit {
    match handle.await {
        Ok(exit) => exit,
        Err(e) => {
            error!(loop_name = name, error = %e, "Bridge loop failed");
            LoopExit::Failed
        }
    }
}

/// Returns true once shutdown was signalled or the handle was dropped.
pub(crate) fn is_cancelled(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Resolves once shutdown is signalled or the handle is dropped. Cancel-safe.
pub(crate) async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
