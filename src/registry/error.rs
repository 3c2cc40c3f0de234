//! Registry error types
//!
//! Error types for room registry operations.

use super::message::{RoomId, UserId};

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Room does not exist or has no subscribers
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),
    /// Sender is not a current member of the room
    #[error("user {user} is not a member of room {room}")]
    NotAMember { room: RoomId, user: UserId },
    /// Internal bookkeeping defect
    #[error("room invariant violated: {0}")]
    InvariantViolation(String),
}
