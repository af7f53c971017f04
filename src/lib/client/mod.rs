//! Subscriber side of the push channel.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::core::Envelope;

type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub reconnect_interval: Duration,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: Duration::from_millis(200),
            max_retries: 5,
        }
    }
}

pub struct LiveClient {
    sender: SplitSink<WsConnection, WsMessage>,
    receiver: SplitStream<WsConnection>,
}

impl LiveClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(url)
            .await
            .context("Failed to connect to WebSocket server")?;
        let (sender, receiver) = ws_stream.split();
        Ok(Self { sender, receiver })
    }

    pub async fn connect_with_retry(config: &ClientConfig) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::connect(&config.url).await {
                Ok(client) => return Ok(client),
                Err(e) if attempt < config.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "Retrying live connection");
                    tokio::time::sleep(config.reconnect_interval).await;
                }
                Err(e) => return Err(e.context(format!("gave up after {attempt} retries"))),
            }
        }
    }

    /// Next decoded push, or `None` once the server closes the stream.
    pub async fn next_notification(&mut self) -> Option<Result<Envelope>> {
        loop {
            match self.receiver.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return Some(
                        serde_json::from_str::<Envelope>(&text).context("Failed to parse notification"),
                    );
                }
                Some(Ok(WsMessage::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(e.into())),
            }
        }
    }

    pub async fn disconnect(mut self) -> Result<()> {
        self.sender
            .send(WsMessage::Close(None))
            .await
            .context("Failed to send close frame")?;
        Ok(())
    }
}
