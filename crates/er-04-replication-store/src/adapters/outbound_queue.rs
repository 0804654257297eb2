//! # Outbound Queue Adapter
//!
//! Encodes queued envelopes straight into the bridge's staging buffer.

use async_trait::async_trait;
use er_02_envelope_codec::EnvelopeCodec;
use er_03_transport_bridge::OutboundSource;
use shared_types::UpdateEnvelope;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// [`OutboundSource`] over the store's unbounded envelope queue.
pub struct EncodingSource {
    queue: mpsc::UnboundedReceiver<UpdateEnvelope>,
    codec: Arc<EnvelopeCodec>,
}

impl EncodingSource {
    pub fn new(queue: mpsc::UnboundedReceiver<UpdateEnvelope>, codec: Arc<EnvelopeCodec>) -> Self {
        Self { queue, codec }
    }
}

#[async_trait]
impl OutboundSource for EncodingSource {
    async fn next_into(&mut self, buf: &mut Vec<u8>) -> bool {
        loop {
            let Some(envelope) = self.queue.recv().await else {
                return false;
            };
            match self.codec.encode_into(&envelope, buf) {
                Ok(()) => return true,
                Err(e) => {
                    error!(
                        entity = %envelope.entity_id,
                        component = %envelope.component_id,
                        error = %e,
                        "Failed to encode envelope, skipping"
                    );
                    buf.clear();
                }
            }
        }
    }

    fn cancel(&mut self) {
        self.queue.close();
    }
}
