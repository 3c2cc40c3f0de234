//! Chat service
//!
//! The `Join` / `Broadcast` surface an RPC layer binds to. Callers arrive
//! with an identity already verified by [`crate::auth::AuthInterceptor`].

use std::future::Future;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::broadcast::{Ack, BroadcastEngine};
use crate::error::{ChatError, Result};
use crate::registry::{RoomId, RoomRegistry};
use crate::server::config::ServiceConfig;
use crate::session::{CloseReason, MessageSink, StreamSession};

/// Chat service
pub struct ChatService {
    config: ServiceConfig,
    registry: Arc<RoomRegistry>,
    engine: BroadcastEngine,
}

impl ChatService {
    /// Create a new service with the given configuration
    pub fn new(config: ServiceConfig) -> Self {
        let registry = Arc::new(RoomRegistry::with_config(config.registry.clone()));
        let engine =
            BroadcastEngine::new(Arc::clone(&registry)).max_content_bytes(config.max_content_bytes);

        Self {
            config,
            registry,
            engine,
        }
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build a stream session for `Join` without running it
    pub fn session(&self, auth: AuthContext, room_id: &str) -> Result<StreamSession> {
        let room_id = self.validate_room_id(room_id)?;
        Ok(StreamSession::new(Arc::clone(&self.registry), auth, room_id))
    }

    /// Server-streaming `Join`
    ///
    /// Streams every message broadcast to the room into `sink` until
    /// `cancel` resolves or the transport fails, then leaves the room.
    pub async fn join<S, F>(
        &self,
        auth: AuthContext,
        room_id: &str,
        sink: &mut S,
        cancel: F,
    ) -> Result<CloseReason>
    where
        S: MessageSink,
        F: Future<Output = ()>,
    {
        let session = self.session(auth, room_id)?;
        let state = session.run(sink, cancel).await;

        state
            .close_reason
            .ok_or_else(|| ChatError::Internal("stream ended without a close reason".into()))
    }

    /// Unary `Broadcast`
    pub fn broadcast(&self, auth: &AuthContext, room_id: &str, content: &str) -> Result<Ack> {
        let room_id = self.validate_room_id(room_id)?;
        self.engine.publish(&room_id, auth, content)
    }

    fn validate_room_id(&self, room_id: &str) -> Result<RoomId> {
        if room_id.is_empty() {
            return Err(ChatError::InvalidArgument("room id is empty".into()));
        }
        if room_id.len() > self.config.max_room_id_len {
            return Err(ChatError::InvalidArgument(format!(
                "room id is {} bytes, limit is {}",
                room_id.len(),
                self.config.max_room_id_len
            )));
        }
        Ok(RoomId::new(room_id))
    }
}

impl Default for ChatService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}
