//! Prints every push sent by a running server.
//!
//! Usage: `watch [ws://host:port/ws]`

use live_todos::client::{ClientConfig, LiveClient};
use live_todos::core::Notification;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let url = std::env::args().nth(1).unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string());
    let mut client = LiveClient::connect_with_retry(&ClientConfig::new(url)).await?;

    while let Some(envelope) = client.next_notification().await {
        let envelope = envelope?;
        match envelope.notification {
            Notification::TodoList { html } => {
                tracing::info!(sent_at = envelope.sent_at, bytes = html.len(), "list changed");
            }
            Notification::TodoDetail { id, html } => {
                tracing::info!(sent_at = envelope.sent_at, id, bytes = html.len(), "detail changed");
            }
            Notification::TodoDeleted { id } => {
                tracing::info!(sent_at = envelope.sent_at, id, "todo removed");
            }
        }
    }
    tracing::info!("server closed the connection");
    Ok(())
}
