//! Join stream controller
//!
//! A [`StreamSession`] owns one client's join stream: it registers the
//! subscriber, pumps the mailbox into the outbound sink in mailbox order,
//! and leaves the room when the stream ends, whatever ended it.

use std::future::Future;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::registry::{ConnectionId, RoomId, RoomRegistry};

use super::sink::MessageSink;
use super::state::{CloseReason, StreamState};

/// Controller for one join stream
pub struct StreamSession {
    registry: Arc<RoomRegistry>,
    auth: AuthContext,
    state: StreamState,
}

impl StreamSession {
    /// Create a session in the `Connecting` phase
    pub fn new(registry: Arc<RoomRegistry>, auth: AuthContext, room_id: RoomId) -> Self {
        let state = StreamState::new(room_id, auth.user_id.clone());
        Self {
            registry,
            auth,
            state,
        }
    }

    /// Current state
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Join the room and stream until the client goes away
    ///
    /// Ends when `cancel` resolves, when a write to `sink` fails, or when
    /// the room drops this subscriber. The room is left exactly once on
    /// every path, including the returned future being dropped mid-stream.
    /// Returns the final state.
    pub async fn run<S, F>(mut self, sink: &mut S, cancel: F) -> StreamState
    where
        S: MessageSink,
        F: Future<Output = ()>,
    {
        let subscription = self.registry.join(&self.state.room_id, &self.auth);
        let connection_id = subscription.connection_id;
        let mut teardown = Teardown::new(
            Arc::clone(&self.registry),
            self.state.room_id.clone(),
            connection_id,
        );
        self.state.on_joined(connection_id);

        let mut mailbox = subscription.mailbox;
        self.state.start_streaming();

        tracing::debug!(
            room = %self.state.room_id,
            connection = %connection_id,
            user = %self.state.user_id,
            "Stream started"
        );

        tokio::pin!(cancel);

        let reason = loop {
            let next = tokio::select! {
                biased;
                () = &mut cancel => break CloseReason::Cancelled,
                message = mailbox.recv() => message,
            };

            let Some(message) = next else {
                break CloseReason::Evicted;
            };

            tokio::select! {
                biased;
                () = &mut cancel => break CloseReason::Cancelled,
                result = sink.send(message) => {
                    if let Err(e) = result {
                        tracing::warn!(
                            room = %self.state.room_id,
                            connection = %connection_id,
                            error = %e,
                            "Stream write failed"
                        );
                        break CloseReason::Transport(e);
                    }
                }
            }

            self.state.on_delivered();
        };

        self.state.dropped = mailbox.dropped();
        self.state.begin_close(reason);
        teardown.run();
        self.state.on_closed();

        tracing::debug!(
            room = %self.state.room_id,
            connection = %connection_id,
            reason = ?self.state.close_reason,
            delivered = self.state.delivered,
            dropped = self.state.dropped,
            duration_ms = self.state.duration().as_millis() as u64,
            "Stream closed"
        );

        self.state
    }
}

/// Leaves the room once, on explicit close or on drop
struct Teardown {
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
    connection_id: ConnectionId,
    done: bool,
}

impl Teardown {
    fn new(registry: Arc<RoomRegistry>, room_id: RoomId, connection_id: ConnectionId) -> Self {
        Self {
            registry,
            room_id,
            connection_id,
            done: false,
        }
    }

    /// Returns `true` if this call performed the teardown
    fn run(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.done = true;

        match self.registry.leave(&self.room_id, self.connection_id) {
            Some(departure) => {
                tracing::debug!(
                    room = %self.room_id,
                    connection = %self.connection_id,
                    member_removed = departure.member_removed,
                    remaining = departure.remaining_subscribers,
                    "Subscriber left"
                );
            }
            None => {
                tracing::debug!(
                    room = %self.room_id,
                    connection = %self.connection_id,
                    "Subscriber already gone"
                );
            }
        }
        true
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if self.run() {
            tracing::debug!(
                room = %self.room_id,
                connection = %self.connection_id,
                "Stream dropped before close, cleaned up"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::broadcast::BroadcastEngine;
    use crate::registry::{ChatMessage, UserId};
    use crate::session::sink::TransportError;
    use crate::session::state::StreamPhase;

    async fn wait_for_subscribers(registry: &RoomRegistry, room: &RoomId, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let count = registry.get(room).map(|r| r.subscriber_count()).unwrap_or(0);
                if count == n {
                    return;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscriber count never reached");
    }

    #[tokio::test]
    async fn test_stream_delivers_in_order_then_cancels() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = BroadcastEngine::new(Arc::clone(&registry));
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");

        let (mut tx, mut rx) = mpsc::channel::<Arc<ChatMessage>>(16);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let session = StreamSession::new(Arc::clone(&registry), alice.clone(), room.clone());
        assert_eq!(session.state().phase, StreamPhase::Connecting);

        let handle = tokio::spawn(async move {
            session
                .run(&mut tx, async {
                    let _ = cancel_rx.await;
                })
                .await
        });

        wait_for_subscribers(&registry, &room, 1).await;

        for i in 0..3 {
            engine.publish(&room, &alice, &i.to_string()).unwrap();
        }
        for i in 0..3 {
            assert_eq!(rx.recv().await.unwrap().content, i.to_string());
        }

        cancel_tx.send(()).unwrap();
        let state = handle.await.unwrap();

        assert!(state.is_closed());
        assert_eq!(state.close_reason, Some(CloseReason::Cancelled));
        assert_eq!(state.delivered, 3);
        assert!(registry.get(&room).is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_triggers_cleanup() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = BroadcastEngine::new(Arc::clone(&registry));
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");
        let bob = AuthContext::new("bob", "Bob");

        // Alice stays connected
        let mut alice_sub = registry.join(&room, &alice);

        let (mut tx, rx) = mpsc::channel::<Arc<ChatMessage>>(16);
        drop(rx);
        let session = StreamSession::new(Arc::clone(&registry), bob, room.clone());
        let handle = tokio::spawn(async move {
            session.run(&mut tx, std::future::pending()).await
        });

        wait_for_subscribers(&registry, &room, 2).await;
        engine.publish(&room, &alice, "hello?").unwrap();

        let state = handle.await.unwrap();
        assert_eq!(
            state.close_reason,
            Some(CloseReason::Transport(TransportError::Closed))
        );

        let lobby = registry.get(&room).unwrap();
        assert_eq!(lobby.subscriber_count(), 1);
        assert!(lobby.member(&UserId::new("bob")).is_none());
        registry.check_invariants().unwrap();

        // The room keeps working for whoever is left
        assert_eq!(alice_sub.mailbox.try_recv().unwrap().content, "hello?");
        let ack = engine.publish(&room, &alice, "still there").unwrap();
        assert_eq!(ack.recipients, 1);
        let msg = alice_sub.mailbox.try_recv().unwrap();
        assert_eq!(msg.id, ack.message_id);
        assert_eq!(msg.content, "still there");
    }

    #[tokio::test]
    async fn test_aborted_task_still_leaves() {
        let registry = Arc::new(RoomRegistry::new());
        let room = RoomId::new("lobby");

        let (mut tx, _rx) = mpsc::channel::<Arc<ChatMessage>>(16);
        let session = StreamSession::new(
            Arc::clone(&registry),
            AuthContext::new("alice", "Alice"),
            room.clone(),
        );
        let handle = tokio::spawn(async move {
            session.run(&mut tx, std::future::pending()).await
        });

        wait_for_subscribers(&registry, &room, 1).await;

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(registry.get(&room).is_none());
    }

    #[tokio::test]
    async fn test_evicted_when_removed_from_room() {
        let registry = Arc::new(RoomRegistry::new());
        let room = RoomId::new("lobby");

        let (mut tx, _rx) = mpsc::channel::<Arc<ChatMessage>>(16);
        let session = StreamSession::new(
            Arc::clone(&registry),
            AuthContext::new("alice", "Alice"),
            room.clone(),
        );
        let handle = tokio::spawn(async move {
            session.run(&mut tx, std::future::pending()).await
        });

        wait_for_subscribers(&registry, &room, 1).await;

        // Remove the subscriber out from under the stream
        let connection_id = registry.get(&room).unwrap().connection_ids()[0];
        assert!(registry.leave(&room, connection_id).is_some());

        let state = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.close_reason, Some(CloseReason::Evicted));
        assert!(state.is_closed());
        assert!(registry.get(&room).is_none());
    }

    #[test]
    fn test_teardown_runs_once() {
        let registry = Arc::new(RoomRegistry::new());
        let room = RoomId::new("lobby");
        let sub = registry.join(&room, &AuthContext::new("alice", "Alice"));

        let mut teardown = Teardown::new(Arc::clone(&registry), room.clone(), sub.connection_id);
        assert!(teardown.run());
        assert!(!teardown.run());
        drop(teardown);

        assert!(registry.get(&room).is_none());
    }

    #[test]
    fn test_teardown_on_drop() {
        let registry = Arc::new(RoomRegistry::new());
        let room = RoomId::new("lobby");
        let sub = registry.join(&room, &AuthContext::new("alice", "Alice"));

        drop(Teardown::new(Arc::clone(&registry), room.clone(), sub.connection_id));
        assert!(registry.get(&room).is_none());
    }
}
