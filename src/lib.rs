//! In-memory multi-room chat
//!
//! Clients join named rooms over a long-lived stream and broadcast text
//! messages that fan out to every live subscriber of the room. Rooms are
//! created on first join and removed when their last subscriber leaves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use roomcast::{AuthContext, ChatMessage, ChatService, ServiceConfig};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> roomcast::Result<()> {
//! let service = Arc::new(ChatService::new(ServiceConfig::default()));
//! let alice = AuthContext::new("alice", "Alice");
//!
//! let (mut tx, mut rx) = mpsc::channel::<Arc<ChatMessage>>(32);
//! let stream = {
//!     let service = Arc::clone(&service);
//!     let alice = alice.clone();
//!     tokio::spawn(async move {
//!         let cancel = async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         };
//!         service.join(alice, "lobby", &mut tx, cancel).await
//!     })
//! };
//!
//! let ack = service.broadcast(&alice, "lobby", "hello")?;
//! println!("delivered to {} subscribers", ack.recipients);
//!
//! while let Some(message) = rx.recv().await {
//!     println!("{}: {}", message.sender.display_name, message.content);
//! }
//! let _ = stream.await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod broadcast;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;

pub use auth::{AuthContext, AuthError, AuthInterceptor, IdentityProvider, StaticIdentityProvider};
pub use broadcast::{Ack, BroadcastEngine};
pub use error::{ChatError, Code, Result};
pub use registry::{
    ChatMessage, Member, MessageId, MessageKind, RegistryConfig, RoomId, RoomRegistry, UserId,
};
pub use server::{ChatService, ServiceConfig};
pub use session::{CloseReason, MessageSink, StreamSession, TransportError};
