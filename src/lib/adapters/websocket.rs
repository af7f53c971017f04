use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::adapters::http::AppState;
use crate::core::{ConnectionRegistry, Envelope};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let registry = state.registry().clone();
    ws.on_upgrade(move |socket| handle_connection(socket, registry))
}

/// Registers the socket, forwards pushes until either side goes away, then
/// deregisters. Anything the client sends is ignored.
#[instrument(skip(socket, registry))]
async fn handle_connection(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut rx) = registry.connect().await;
    info!(connection = %id, "Live connection established");

    let mut send_task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let todo_id = notification.todo_id();
            let envelope = Envelope { notification, sent_at: Utc::now().timestamp() };
            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize notification");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                debug!(connection = %id, todo = ?todo_id, "Client went away while pushing");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "WebSocket message error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.disconnect(id).await;
    info!(connection = %id, "Live connection closed");
}
