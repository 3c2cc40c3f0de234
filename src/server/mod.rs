//! Service surface
//!
//! [`ChatService`] wires the registry, broadcast engine and stream sessions
//! together behind `Join` and `Broadcast`.

pub mod config;
pub mod service;

pub use config::ServiceConfig;
pub use service::ChatService;
