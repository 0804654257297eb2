//! Outbound loop: source → publication.

use super::{cancelled, is_cancelled};
use crate::domain::{BackoffIdle, IdleConfig, LoopCounters, LoopExit};
use crate::ports::outbound::OutboundSource;
use shared_bus::{OfferOutcome, Publication};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Publish every message from `source`, in order, until the source is
/// exhausted, the transport closes or shutdown is signalled.
///
/// A message that is not accepted is retried unchanged; nothing is skipped.
pub(crate) async fn run_outbound<S: OutboundSource>(
    mut publication: Box<dyn Publication>,
    mut source: S,
    buffer_size: usize,
    idle: IdleConfig,
    mut shutdown: watch::Receiver<bool>,
    counters: Arc<LoopCounters>,
) -> LoopExit {
    let session_id = publication.session_id();
    let mut idle = BackoffIdle::new(idle);
    let mut staging = Vec::with_capacity(buffer_size);

    let exit = 'run: loop {
        staging.clear();
        let has_message = tokio::select! {
            biased;
            _ = cancelled(&mut shutdown) => break 'run LoopExit::Cancelled,
            has_message = source.next_into(&mut staging) => has_message,
        };
        if !has_message {
            break 'run LoopExit::SourceExhausted;
        }

        loop {
            match publication.offer(&staging) {
                OfferOutcome::Accepted => {
                    counters.record_sent();
                    idle.reset();
                    break;
                }
                OfferOutcome::Closed => {
                    warn!(session_id, "Publication closed, stopping outbound loop");
                    source.cancel();
                    break 'run LoopExit::TransportClosed;
                }
                outcome => {
                    counters.record_retry();
                    trace!(session_id, ?outcome, len = staging.len(), "Offer not accepted");
                    idle.idle().await;
                }
            }
            if is_cancelled(&shutdown) {
                break 'run LoopExit::Cancelled;
            }
        }
    };

    publication.close();
    debug!(session_id, ?exit, "Outbound loop exited");
    exit
}
