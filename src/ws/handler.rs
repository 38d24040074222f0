//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::config::Config;
use crate::game::ConnectionId;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, DecodeError, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    // Browsers always send Origin; tools that omit it are let through
    if !origin_permitted(&state.config, &headers) {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("<invalid>");
        warn!(origin = %origin, "WebSocket upgrade from disallowed origin");
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Check the request's Origin header against the configured list
fn origin_permitted(config: &Config, headers: &HeaderMap) -> bool {
    match headers.get(header::ORIGIN) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|origin| config.origin_allowed(origin))
            .unwrap_or(false),
    }
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = ConnectionId::new();
    info!(connection_id = %connection, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Registers the outbound queue and queues the hello greeting
    let outbound_rx = state.lobby.connect(connection);

    run_session(connection, &state, ws_sink, ws_stream, outbound_rx).await;

    state.lobby.disconnect(connection);

    info!(connection_id = %connection, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection: ConnectionId,
    state: &AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    // Spawn writer task: outbound queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(connection_id = %connection, error = %e, "Failed to encode server message");
                    continue;
                }
            };

            if let Err(e) = ws_sink.send(Message::Text(json)).await {
                debug!(connection_id = %connection, error = %e, "WebSocket send failed");
                break;
            }
        }
        debug!(connection_id = %connection, "Outbound queue closed");
    });

    // Reader loop: WebSocket -> lobby
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_inbound() {
                    warn!(connection_id = %connection, "Rate limited inbound message");
                    continue;
                }

                match ClientMsg::decode(&text) {
                    Ok(client_msg) => state.lobby.handle(connection, client_msg),
                    Err(e @ DecodeError::Malformed { .. }) => {
                        debug!(connection_id = %connection, error = %e, "Dropped malformed client message");
                    }
                    Err(e @ DecodeError::Syntax(_)) => {
                        warn!(connection_id = %connection, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(connection_id = %connection, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(connection_id = %connection, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}
