//! Broadcast engine

pub mod engine;

pub use engine::{Ack, BroadcastEngine, ACK_SUCCESS};
