//! Caller-facing error type
//!
//! Everything `Join` and `Broadcast` can return to a client. Transport
//! failures never appear here; they end one stream and show up in its
//! close reason.

use crate::auth::AuthError;
use crate::registry::{RegistryError, RoomId, UserId};

/// Result alias for caller-facing operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// RPC status code a [`ChatError`] maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Unauthenticated,
    NotFound,
    InvalidArgument,
    Internal,
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Code::Unauthenticated => "UNAUTHENTICATED",
            Code::NotFound => "NOT_FOUND",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// Error returned from `Join` and `Broadcast`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("user {user} is not in room {room}")]
    NotAMember { room: RoomId, user: UserId },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Status code to surface to the client
    pub fn code(&self) -> Code {
        match self {
            ChatError::Auth(_) => Code::Unauthenticated,
            ChatError::RoomNotFound(_) => Code::NotFound,
            ChatError::NotAMember { .. } | ChatError::InvalidArgument(_) => Code::InvalidArgument,
            ChatError::Internal(_) => Code::Internal,
        }
    }
}

impl From<RegistryError> for ChatError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::RoomNotFound(room) => ChatError::RoomNotFound(room),
            RegistryError::NotAMember { room, user } => ChatError::NotAMember { room, user },
            RegistryError::InvariantViolation(detail) => ChatError::Internal(detail),
        }
    }
}
