//! Bounded per-subscriber mailbox
//!
//! Each subscriber owns a single-receiver `tokio::sync::broadcast` channel.
//! The broadcast channel never blocks the sender: when the buffer is full,
//! the oldest unread message is overwritten and the receiver learns how many
//! it missed through `RecvError::Lagged`. That gives the drop-oldest policy
//! for free, and the drop count is only visible on the receiving side.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::config::MAX_MAILBOX_CAPACITY;
use super::message::ChatMessage;

/// Create a mailbox pair with the given capacity
///
/// `capacity` is clamped to `1..=MAX_MAILBOX_CAPACITY`. tokio rounds it up
/// to a power of two; `RegistryConfig` does the rounding up front so the
/// configured value is the effective one.
pub fn mailbox(capacity: usize) -> (MailboxSender, Mailbox) {
    let (tx, rx) = broadcast::channel(capacity.clamp(1, MAX_MAILBOX_CAPACITY));
    (MailboxSender { tx }, Mailbox { rx, dropped: 0 })
}

/// Room-side handle used to enqueue messages
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: broadcast::Sender<Arc<ChatMessage>>,
}

impl MailboxSender {
    /// Enqueue a message without waiting
    ///
    /// Returns `false` if the receiving side is gone.
    pub fn push(&self, message: Arc<ChatMessage>) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Check whether the receiving side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.receiver_count() == 0
    }
}

/// Connection-side end of a mailbox
#[derive(Debug)]
pub struct Mailbox {
    rx: broadcast::Receiver<Arc<ChatMessage>>,
    dropped: u64,
}

impl Mailbox {
    /// Wait for the next message in FIFO order
    ///
    /// Returns `None` once the room side has been dropped and everything
    /// queued before that has been received.
    pub async fn recv(&mut self) -> Option<Arc<ChatMessage>> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next message if one is ready
    pub fn try_recv(&mut self) -> Option<Arc<ChatMessage>> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Total messages lost to overflow since the mailbox was created
    ///
    /// Monotonically increasing.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn record_lag(&mut self, skipped: u64) {
        self.dropped += skipped;
        tracing::debug!(
            skipped = skipped,
            total_dropped = self.dropped,
            "Mailbox overflow, oldest messages dropped"
        );
    }
}
