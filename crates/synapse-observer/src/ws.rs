//! `WebSocket` transport for the engine message protocol.
//!
//! Clients connect to `GET /ws/engine`. Every `UPDATE` and `FAULT` the
//! engine publishes is forwarded as a JSON text frame. Text frames sent by
//! the client are decoded as inbound commands and handed to the engine.
//!
//! If a client falls behind, lagged messages are skipped; each update
//! replaces the previous one, so the client only loses intermediate
//! snapshots.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use synapse_types::InboundMessage;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` engine session.
///
/// # Route
///
/// `GET /ws/engine`
pub async fn ws_engine(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize engine message: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Text(text))) => forward_command(&state, text.as_str()),
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Decode one client frame and pass it to the engine. Bad frames are
/// logged and dropped; the session stays open.
fn forward_command(state: &AppState, text: &str) {
    let command = match InboundMessage::decode(text) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Dropped malformed WebSocket command");
            return;
        }
    };
    let Some(engine) = state.engine.as_ref() else {
        warn!(command = command.tag(), "WebSocket command ignored, no engine attached");
        return;
    };
    if let Err(e) = engine.send(command) {
        warn!(error = %e, "WebSocket command not delivered");
    }
}
