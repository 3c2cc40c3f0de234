//! Room registry for multi-room fan-out
//!
//! The registry maps room IDs to rooms and routes each broadcast message to
//! every live connection in the target room. Every connection owns a bounded
//! mailbox; fan-out pushes one `Arc<ChatMessage>` into each of them without
//! waiting, so a stalled client can never hold up the broadcaster.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<RoomRegistry>
//!                     ┌─────────────────────────┐
//!                     │ rooms: HashMap<RoomId,  │
//!                     │   Room {                │
//!                     │     members,            │
//!                     │     subscribers: [tx],  │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Broadcaster]          [StreamSession]         [StreamSession]
//!    engine.publish()       mailbox.recv()          mailbox.recv()
//!         │                       │                       │
//!         └──► room.broadcast() ──► sink.send() ──► transport
//! ```
//!
//! # Locking
//!
//! The map has one `RwLock` that decides creation and removal; every room
//! has its own `Mutex` for membership. Fan-out pushes into every mailbox
//! under the room lock; a push never waits, so per-subscriber order follows
//! lock order.

pub mod config;
pub mod error;
pub mod mailbox;
pub mod member;
pub mod message;
pub mod room;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use mailbox::{Mailbox, MailboxSender};
pub use member::Member;
pub use message::{ChatMessage, ConnectionId, MessageId, MessageKind, RoomId, RoomRef, UserId};
pub use room::{Departure, Room, RoomStats, Subscriber, Subscription};
pub use store::RoomRegistry;
