//! Inbound loop: subscription → assembler → sink.

use super::is_cancelled;
use crate::domain::{BackoffIdle, FragmentAssembler, IdleConfig, LoopCounters, LoopExit};
use shared_bus::{Subscription, TransportError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Poll `subscription` and forward every complete message to `sink` until
/// the transport closes, the sink goes away or shutdown is signalled.
pub(crate) async fn run_inbound(
    mut subscription: Box<dyn Subscription>,
    sink: mpsc::UnboundedSender<Vec<u8>>,
    fragment_limit: usize,
    idle: IdleConfig,
    shutdown: watch::Receiver<bool>,
    counters: Arc<LoopCounters>,
) -> LoopExit {
    let mut idle = BackoffIdle::new(idle);
    let mut assembler = FragmentAssembler::new();

    let exit = 'run: loop {
        if is_cancelled(&shutdown) {
            break LoopExit::Cancelled;
        }
        if sink.is_closed() {
            break LoopExit::SinkClosed;
        }

        let fragments = match subscription.poll(fragment_limit) {
            Ok(fragments) => fragments,
            Err(TransportError::Closed) => {
                warn!("Subscription closed, stopping inbound loop");
                break LoopExit::TransportClosed;
            }
            Err(e) => {
                warn!(error = %e, "Subscription poll failed");
                idle.idle().await;
                continue;
            }
        };

        if fragments.is_empty() {
            idle.idle().await;
            continue;
        }
        idle.reset();

        for fragment in fragments {
            if let Some(message) = assembler.on_fragment(fragment) {
                if sink.send(message).is_err() {
                    break 'run LoopExit::SinkClosed;
                }
                counters.record_received();
            }
        }
        counters.set_dropped_fragments(assembler.dropped_fragments());

        // A busy stream must not monopolise a worker thread.
        tokio::task::yield_now().await;
    };

    counters.set_dropped_fragments(assembler.dropped_fragments());
    subscription.close();
    debug!(?exit, "Inbound loop exited");
    exit
}
