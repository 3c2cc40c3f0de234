//! Outbound transport seam

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::registry::ChatMessage;

/// Failure writing to a client stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("stream closed by peer")]
    Closed,
    #[error("write failed: {0}")]
    Write(String),
}

/// Where a stream session writes its messages
///
/// An RPC layer implements this over its response stream. Writes may
/// suspend; the session races every write against cancellation.
pub trait MessageSink: Send {
    fn send(
        &mut self,
        message: Arc<ChatMessage>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Bridge into a channel-backed response stream
impl MessageSink for mpsc::Sender<Arc<ChatMessage>> {
    async fn send(&mut self, message: Arc<ChatMessage>) -> Result<(), TransportError> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|_| TransportError::Closed)
    }
}
