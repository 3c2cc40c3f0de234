//! Room member record

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::message::UserId;

/// A user's logical presence in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Verified user ID
    pub id: UserId,
    /// Display name reported by the identity provider
    pub display_name: String,
    /// When the user first joined the room
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Create a member that joins now
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            joined_at: Utc::now(),
        }
    }
}
