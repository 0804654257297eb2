//! # Outbound Ports
//!
//! The queue side of the outbound loop.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Source of messages for the outbound loop.
///
/// The loop owns the source for its whole lifetime and takes one message at
/// a time, retrying it until the transport accepts it.
#[async_trait]
pub trait OutboundSource: Send {
    /// Wait for the next message and write it into `buf`, which the caller
    /// has cleared.
    ///
    /// Returns false once the source is exhausted. Must be cancel-safe: the
    /// loop drops this future when shutdown is signalled.
    async fn next_into(&mut self, buf: &mut Vec<u8>) -> bool;

    /// Stop accepting new items. Called when the transport closes.
    fn cancel(&mut self);
}

#[async_trait]
impl OutboundSource for mpsc::UnboundedReceiver<Vec<u8>> {
    async fn next_into(&mut self, buf: &mut Vec<u8>) -> bool {
        match self.recv().await {
            Some(message) => {
                buf.extend_from_slice(&message);
                true
            }
            None => false,
        }
    }

    fn cancel(&mut self) {
        self.close();
    }
}
