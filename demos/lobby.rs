//! Two clients chatting in one room
//!
//! Run with: cargo run --example lobby [ROOM]
//!
//! Set `RUST_LOG=roomcast=trace` for mailbox-level detail.

use std::sync::Arc;
use std::time::Duration;

use roomcast::{
    AuthContext, AuthInterceptor, ChatMessage, ChatService, ServiceConfig, StaticIdentityProvider,
};
use tokio::sync::{mpsc, oneshot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let room = std::env::args().nth(1).unwrap_or_else(|| "lobby".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomcast=debug".parse()?)
                .add_directive("lobby=debug".parse()?),
        )
        .init();

    let interceptor = AuthInterceptor::new(
        StaticIdentityProvider::new()
            .with_token("tok-alice", AuthContext::new("alice", "Alice"))
            .with_token("tok-bob", AuthContext::new("bob", "Bob")),
    );
    let service = Arc::new(ChatService::new(ServiceConfig::default().mailbox_capacity(32)));

    let alice = interceptor.authenticate([("authorization", "Bearer tok-alice")])?;
    let bob = interceptor.authenticate([("authorization", "Bearer tok-bob")])?;

    let mut cancels = Vec::new();
    let mut streams = Vec::new();
    for auth in [alice.clone(), bob.clone()] {
        let (mut tx, mut rx) = mpsc::channel::<Arc<ChatMessage>>(32);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        cancels.push(cancel_tx);

        let name = auth.display_name.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                println!(
                    "[{name}] {} > {}",
                    message.sender.display_name, message.content
                );
            }
        });

        let service = Arc::clone(&service);
        let room = room.clone();
        streams.push(tokio::spawn(async move {
            service
                .join(auth, &room, &mut tx, async {
                    let _ = cancel_rx.await;
                })
                .await
        }));
    }

    // Give both streams a moment to register
    tokio::time::sleep(Duration::from_millis(50)).await;

    let ack = service.broadcast(&alice, &room, "hi Bob")?;
    tracing::info!(message = %ack.message_id, recipients = ack.recipients, "Alice posted");
    let ack = service.broadcast(&bob, &room, "hey Alice")?;
    tracing::info!(message = %ack.message_id, recipients = ack.recipients, "Bob posted");

    tokio::time::sleep(Duration::from_millis(50)).await;

    for cancel in cancels {
        let _ = cancel.send(());
    }
    for stream in streams {
        let reason = stream.await??;
        tracing::info!(reason = ?reason, "Stream closed");
    }

    tracing::info!(rooms = service.registry().room_count(), "Done");
    Ok(())
}
