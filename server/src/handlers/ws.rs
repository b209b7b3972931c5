//! Subscriber WebSocket
//!
//! Every connection becomes one hub subscriber. A forward task drains the
//! subscriber queue into the socket; the read loop answers `ping` through the
//! same queue so replies stay ordered with broadcasts. Once the hub evicts a
//! subscriber the forward task closes the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use roomsense_core::logic::broadcast::{ClientMessage, ServerMessage};

use crate::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[tracing::instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let hub = &state.ctx.hub;
    let mut subscription = hub.subscribe();
    let id = subscription.id;
    let (mut sender, mut receiver) = socket.split();

    // Ends when the socket fails or the hub evicts this subscriber
    let mut forward = tokio::spawn(async move {
        while let Some(message) = subscription.receiver.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Unserializable message skipped: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut forward => {
                tracing::debug!("Subscriber {} dropped by the hub", id);
                break;
            }
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        hub.send_to(id, ServerMessage::Pong);
                    }
                    Err(e) => tracing::debug!("Ignoring client message from {}: {}", id, e),
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.unsubscribe(id);
    forward.abort();
    tracing::debug!("Subscriber {} closed", id);
}
