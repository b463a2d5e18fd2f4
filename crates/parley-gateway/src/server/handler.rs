//! WebSocket handler
//!
//! Authenticates the handshake, then drives one upgraded connection: a
//! reader, a writer fed by the connection's queue, and a heartbeat.

use super::auth::{authenticate, extract_token, GatewayQuery, HandshakeRejection};
use crate::connection::{Connection, Outbound};
use crate::handlers::{handle_text, Heartbeat};
use crate::protocol::CloseCode;
use crate::server::GatewayState;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parley_core::{ConnectionId, Identity, User};
use parley_service::SessionService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the writer gets to flush a close frame
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket gateway handler
///
/// The token is checked before the upgrade so a bad token gets a plain
/// 401 response.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user = match authenticate(&state, extract_token(&query, &headers)).await {
        Ok(user) => user,
        Err(e) => return HandshakeRejection(e).into_response(),
    };

    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(state, socket, user))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, user: User) {
    let identity = Identity::new(&user, ConnectionId::new());
    let connection_id = identity.connection_id;

    let (tx, rx) = mpsc::channel::<Outbound>(state.config().connection.send_buffer);
    let connection = state
        .connection_manager()
        .add_connection(identity.clone(), tx);

    tracing::info!(
        connection_id = %connection_id,
        user_id = %identity.user_id,
        "WebSocket connection established"
    );

    let (ws_sink, ws_stream) = socket.split();
    let mut send_task = tokio::spawn(write_loop(ws_sink, rx, connection_id));

    if let Err(e) = SessionService::new(state.service_context())
        .connect(&identity)
        .await
    {
        if e.is_internal() {
            tracing::error!(connection_id = %connection_id, error = %e, "Session connect failed");
        } else {
            tracing::warn!(connection_id = %connection_id, error = %e, "Session refused");
        }
        let code = if e.is_internal() {
            CloseCode::UnknownError
        } else {
            CloseCode::AuthenticationFailed
        };
        state.connection_manager().remove_connection(connection_id);
        connection.close(Some(code));
        let _ = tokio::time::timeout(CLOSE_GRACE, &mut send_task).await;
        send_task.abort();
        return;
    }

    let mut recv_task = tokio::spawn(read_loop(state.clone(), connection.clone(), ws_stream));
    let mut heartbeat_task = tokio::spawn(
        Heartbeat::from_config(&state.config().connection).run(connection.clone()),
    );

    // Wait for any task to complete
    let (close_code, writer_done) = tokio::select! {
        result = &mut recv_task => (result.ok().flatten(), false),
        result = &mut heartbeat_task => (result.ok(), false),
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            (None, true)
        }
    };
    recv_task.abort();
    heartbeat_task.abort();

    if !writer_done {
        if let Some(code) = close_code {
            tracing::debug!(connection_id = %connection_id, close_code = %code, "Closing connection");
        }
        connection.close(close_code);
        let _ = tokio::time::timeout(CLOSE_GRACE, &mut send_task).await;
    }
    send_task.abort();

    cleanup_connection(&state, &connection).await;
}

/// Read client frames in order until the socket ends
///
/// Returns the close code when the server should end the connection.
async fn read_loop(
    state: GatewayState,
    connection: Arc<Connection>,
    mut ws_stream: SplitStream<WebSocket>,
) -> Option<CloseCode> {
    let connection_id = connection.id();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_text(&state, &connection, &text).await;
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(connection_id = %connection_id, "Binary frames not supported");
                return Some(CloseCode::DecodeError);
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
                tracing::trace!(connection_id = %connection_id, "Ping received");
            }
            Ok(Message::Pong(_)) => {
                connection.record_pong();
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                return None;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                return Some(CloseCode::UnknownError);
            }
        }
    }
    None
}

/// Write queued frames to the socket until closed
async fn write_loop(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Outbound>,
    connection_id: ConnectionId,
) {
    while let Some(frame) = rx.recv().await {
        let message = match frame {
            Outbound::Event(event) => match event.to_json() {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_id,
                        event = event.name(),
                        error = %e,
                        "Failed to encode event"
                    );
                    continue;
                }
            },
            Outbound::Ping => Message::Ping(Vec::new()),
            Outbound::Close(code) => {
                let frame = code.map(|code| CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                });
                let _ = ws_sink.send(Message::Close(frame)).await;
                break;
            }
        };

        if ws_sink.send(message).await.is_err() {
            tracing::debug!(connection_id = %connection_id, "Failed to write to WebSocket");
            break;
        }
    }

    let _ = ws_sink.close().await;
}

/// Drop the connection's subscriptions and run the disconnect transition
async fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>) {
    tracing::info!(
        connection_id = %connection.id(),
        age_secs = connection.age().as_secs(),
        "Cleaning up connection"
    );

    state.connection_manager().remove_connection(connection.id());

    if let Err(e) = SessionService::new(state.service_context())
        .disconnect(connection.identity())
        .await
    {
        tracing::error!(connection_id = %connection.id(), error = %e, "Session disconnect failed");
    }
}
