//! WebSocket transport for `/mcp`.
//!
//! Each connection is its own session: the bearer token presented at upgrade
//! is re-validated on every message, JSON-RPC frames are dispatched through
//! the same path as HTTP POSTs, and an idle timer closes connections that go
//! quiet.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::oauth::handlers::request_origin;
use super::transport::{
    HttpState, JsonRpcRequest, JsonRpcResponse, RpcOutcome, bearer_token, dispatch_rpc,
};

/// Response for WebSocket intent without a completable handshake.
///
/// Clients that set `Upgrade: websocket` but miss the key/version headers
/// asked for WebSocket and should hear a WebSocket-flavored answer, not a
/// fallback to another protocol.
#[must_use]
pub fn upgrade_required() -> Response {
    (
        StatusCode::UPGRADE_REQUIRED,
        [(header::UPGRADE, "websocket"), (header::CONNECTION, "Upgrade")],
        "WebSocket upgrade required",
    )
        .into_response()
}

/// Accept a WebSocket handshake and serve the session.
pub fn serve(state: Arc<HttpState>, upgrade: WebSocketUpgrade, headers: &HeaderMap) -> Response {
    let bearer = bearer_token(headers).map(ToString::to_string);
    let origin = request_origin(headers, &state.config);
    upgrade.on_upgrade(move |socket| serve_connection(state, socket, bearer, origin))
}

async fn serve_connection(
    state: Arc<HttpState>,
    mut socket: WebSocket,
    bearer: Option<String>,
    origin: String,
) {
    let session_id = uuid::Uuid::new_v4();
    tracing::info!(session_id = %session_id, authenticated = bearer.is_some(), "WebSocket session opened");

    loop {
        let frame = match tokio::time::timeout(state.config.ws_idle_timeout, socket.recv()).await
        {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(error))) => {
                tracing::debug!(session_id = %session_id, error = %error, "WebSocket receive error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!(session_id = %session_id, "WebSocket session idle, closing");
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Ping/Pong are answered by the protocol layer; binary frames
            // are not part of MCP
            _ => continue,
        };

        let request: JsonRpcRequest = match serde_json::from_str(text.as_str()) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(session_id = %session_id, error = %error, "unparseable WebSocket frame");
                let reply = JsonRpcResponse::error(None, -32700, "Parse error");
                if send_reply(&mut socket, &reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        // Re-validate per message so token expiry ends a long-lived session
        // at the next call
        let auth = match bearer.as_deref() {
            Some(token) => match state.oauth.validate_access_token(token).await {
                Ok(record) => record,
                Err(error) => {
                    tracing::error!(session_id = %session_id, error = %error, "access token validation failed");
                    None
                }
            },
            None => None,
        };

        match dispatch_rpc(&state, request, auth.as_ref(), &origin).await {
            RpcOutcome::Reply(reply) | RpcOutcome::Unauthorized(reply) => {
                if send_reply(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
            RpcOutcome::Accepted => {}
        }
    }

    tracing::info!(session_id = %session_id, "WebSocket session closed");
}

async fn send_reply(socket: &mut WebSocket, reply: &JsonRpcResponse) -> Result<(), axum::Error> {
    let text = serde_json::to_string(reply).unwrap_or_default();
    socket.send(Message::Text(text.into())).await
}
