//! Publish path
//!
//! Resolves the target room, checks the sender's membership, builds the
//! message and hands it to the room for fan-out. `publish` runs on the
//! caller's task and never waits on a subscriber.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::AuthContext;
use crate::error::{ChatError, Result};
use crate::registry::{ChatMessage, MessageId, RoomId, RoomRegistry};

/// Status string of a successful publish
pub const ACK_SUCCESS: &str = "success";

/// Acknowledgement of a publish
///
/// Confirms the message was handed to the room, not that any subscriber
/// received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub status: String,
    pub room_id: RoomId,
    pub message_id: MessageId,
    /// Mailboxes the message was enqueued into
    pub recipients: usize,
}

/// Validates and fans out broadcast requests
#[derive(Clone)]
pub struct BroadcastEngine {
    registry: Arc<RoomRegistry>,
    max_content_bytes: usize,
}

impl BroadcastEngine {
    /// Create an engine with no content size limit
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            max_content_bytes: usize::MAX,
        }
    }

    /// Reject message bodies longer than `max` bytes
    pub fn max_content_bytes(mut self, max: usize) -> Self {
        self.max_content_bytes = max;
        self
    }

    /// Broadcast `content` from `sender` to every subscriber of `room_id`
    ///
    /// Fails with `RoomNotFound` if the room has no subscribers (no room is
    /// created) and with `NotAMember` if the sender is not joined. Delivery
    /// is best effort.
    pub fn publish(&self, room_id: &RoomId, sender: &AuthContext, content: &str) -> Result<Ack> {
        if content.len() > self.max_content_bytes {
            return Err(ChatError::InvalidArgument(format!(
                "message is {} bytes, limit is {}",
                content.len(),
                self.max_content_bytes
            )));
        }

        let room = self.registry.get_active(room_id)?;

        let member = room
            .member(&sender.user_id)
            .ok_or_else(|| ChatError::NotAMember {
                room: room_id.clone(),
                user: sender.user_id.clone(),
            })?;

        let message = Arc::new(ChatMessage::new(room_id.clone(), member, content));
        let message_id = message.id;

        let recipients = room.broadcast(message, &sender.user_id)?;

        tracing::debug!(
            room = %room_id,
            user = %sender.user_id,
            message = %message_id,
            recipients = recipients,
            "Message published"
        );

        Ok(Ack {
            status: ACK_SUCCESS.to_string(),
            room_id: room_id.clone(),
            message_id,
            recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistryConfig, UserId};

    fn engine() -> (Arc<RoomRegistry>, BroadcastEngine) {
        let registry = Arc::new(RoomRegistry::new());
        let engine = BroadcastEngine::new(Arc::clone(&registry));
        (registry, engine)
    }

    #[test]
    fn test_publish_delivers_member_snapshot() {
        let (registry, engine) = engine();
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");
        let mut sub = registry.join(&room, &alice);

        let ack = engine.publish(&room, &alice, "hi").unwrap();
        assert_eq!(ack.status, ACK_SUCCESS);
        assert_eq!(ack.room_id, room);
        assert_eq!(ack.recipients, 1);

        let msg = sub.mailbox.try_recv().unwrap();
        assert_eq!(msg.id, ack.message_id);
        assert_eq!(msg.room_id(), &room);
        assert_eq!(msg.sender, sub.member);
        assert_eq!(msg.content, "hi");
    }

    #[test]
    fn test_publish_to_unknown_room() {
        let (registry, engine) = engine();
        let room = RoomId::new("nowhere");

        let result = engine.publish(&room, &AuthContext::new("alice", "Alice"), "hi");
        assert_eq!(result, Err(ChatError::RoomNotFound(room.clone())));
        assert!(registry.get(&room).is_none());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_publish_by_non_member() {
        let (registry, engine) = engine();
        let room = RoomId::new("lobby");
        let mut sub = registry.join(&room, &AuthContext::new("alice", "Alice"));

        let result = engine.publish(&room, &AuthContext::new("bob", "Bob"), "hi");
        assert_eq!(
            result,
            Err(ChatError::NotAMember {
                room: room.clone(),
                user: UserId::new("bob"),
            })
        );
        assert!(sub.mailbox.try_recv().is_none());
    }

    #[test]
    fn test_publish_never_blocks_on_full_mailboxes() {
        let registry = Arc::new(RoomRegistry::with_config(
            RegistryConfig::default().mailbox_capacity(1),
        ));
        let engine = BroadcastEngine::new(Arc::clone(&registry));
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");
        let mut sub = registry.join(&room, &alice);

        for i in 0..1000 {
            engine.publish(&room, &alice, &i.to_string()).unwrap();
        }

        assert_eq!(sub.mailbox.try_recv().unwrap().content, "999");
        assert_eq!(sub.mailbox.dropped(), 999);
    }

    #[test]
    fn test_oversized_content_rejected() {
        let (registry, _) = engine();
        let engine = BroadcastEngine::new(Arc::clone(&registry)).max_content_bytes(4);
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");
        let _sub = registry.join(&room, &alice);

        assert!(engine.publish(&room, &alice, "four").is_ok());
        assert!(matches!(
            engine.publish(&room, &alice, "five!"),
            Err(ChatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ack_wire_shape() {
        let (registry, engine) = engine();
        let room = RoomId::new("lobby");
        let alice = AuthContext::new("alice", "Alice");
        let _sub = registry.join(&room, &alice);

        let ack = engine.publish(&room, &alice, "hi").unwrap();
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["roomId"], "lobby");
        assert_eq!(json["recipients"], 1);
    }
}
