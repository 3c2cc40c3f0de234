//! Identifier and message types for room routing
//!
//! This module defines the keys used to address rooms, users and
//! connections, and the message that is fanned out to subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::member::Member;

/// Unique identifier for a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a new room ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Verified user identifier, as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one live connection (one subscriber)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh, process-unique connection ID
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Globally unique message identifier (UUIDv7, time ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Room reference embedded in outbound messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomRef {
    pub id: RoomId,
}

/// Payload discriminator carried on every outbound message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Text posted by a room member
    #[default]
    CommonMessage,
}

/// A chat message to be broadcast to subscribers
///
/// Immutable once built. Fan-out shares one allocation behind an `Arc`
/// across every mailbox the message is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message ID
    pub id: MessageId,
    #[serde(rename = "messageType")]
    pub kind: MessageKind,
    /// Room the message was broadcast to
    pub room: RoomRef,
    /// Snapshot of the sending member at publish time
    pub sender: Member,
    /// Message body
    pub content: String,
    /// When the message was built
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message with a fresh ID stamped with the current time
    pub fn new(room: RoomId, sender: Member, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            kind: MessageKind::CommonMessage,
            room: RoomRef { id: room },
            sender,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room.id
    }
}
