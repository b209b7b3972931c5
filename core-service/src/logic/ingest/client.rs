//! Upstream WebSocket client
//!
//! Connects, subscribes to entity updates and feeds every text frame to the
//! pipeline. Connection loss ends the loop with an error; there is no
//! reconnect here.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::pipeline::IngestPipeline;
use super::wire::UpstreamRequest;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upstream connect failed: {0}")]
    Connect(String),

    #[error("upstream connection closed")]
    ConnectionClosed,

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct IngestClient {
    url: String,
}

impl IngestClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Run until the connection drops. Never returns `Ok`.
    pub async fn run(&self, pipeline: IngestPipeline) -> Result<(), IngestError> {
        let (mut stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| IngestError::Connect(e.to_string()))?;
        log::info!("Connected to upstream {}", self.url);

        let subscribe = serde_json::to_string(&UpstreamRequest::subscribe_entity_updates())?;
        stream
            .send(Message::Text(subscribe))
            .await
            .map_err(|e| IngestError::Transport(e.to_string()))?;
        log::info!("Subscribed to entity updates");

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    pipeline.handle_text(&text);
                }
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        pipeline.handle_text(text);
                    }
                    Err(e) => log::warn!("Non-UTF-8 upstream frame dropped: {}", e),
                },
                Ok(Message::Close(frame)) => {
                    log::warn!("Upstream closed the connection: {:?}", frame);
                    break;
                }
                // Ping replies are queued by tungstenite itself
                Ok(_) => {}
                Err(e) => {
                    log::error!("Upstream read failed: {}", e);
                    return Err(IngestError::Transport(e.to_string()));
                }
            }
        }

        Err(IngestError::ConnectionClosed)
    }
}
