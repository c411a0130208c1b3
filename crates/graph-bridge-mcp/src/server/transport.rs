//! HTTP transport: one `/mcp` endpoint speaking three protocols.
//!
//! Requests are classified by their handshake rather than by separate routes:
//! WebSocket signals win (even degraded ones, which get `426 Upgrade
//! Required`), then `GET` with an `Accept: text/event-stream` becomes an SSE
//! bootstrap stream, then `POST` is a JSON-RPC message. Anything else is 405.
//!
//! Authentication is soft for the MCP handshake: discovery methods work
//! without a token so clients can learn the server's shape, while everything
//! else answers with `-32001` and the authorization URL to visit.

use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequestParts, Request, State, ws::WebSocketUpgrade},
    http::{HeaderMap, Method, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{any, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::types::AccessTokenRecord;
use super::oauth::{OAuthStore, bridge, grants, handlers};
use super::ws;
use crate::config::Config;
use crate::graph::GraphClient;
use crate::server::oauth::handlers::request_origin;
use crate::tools::{McpTool, ToolContext};
use crate::upstream::TokenExchanger;

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into(), data: None }),
            id,
        }
    }

    #[must_use]
    pub fn error_with_data(
        id: Option<serde_json::Value>,
        code: i32,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into(), data: Some(data) }),
            id,
        }
    }
}

/// MCP tool info for tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub config: Config,
    pub oauth: OAuthStore,
    pub exchanger: TokenExchanger,
    pub graph: Arc<GraphClient>,
    pub tools: Vec<Box<dyn McpTool>>,
}

/// Protocol selected for a request to `/mcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    WebSocket,
    Sse,
    JsonRpc,
    Unsupported,
}

impl Protocol {
    /// Classify a request by method and handshake headers.
    ///
    /// WebSocket intent is honored even when the handshake is incomplete, so
    /// a degraded upgrade gets a WebSocket-flavored error instead of being
    /// misread as SSE.
    #[must_use]
    pub fn classify(method: &Method, headers: &HeaderMap) -> Self {
        let upgrade_websocket = headers
            .get(header::UPGRADE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("websocket"));
        let handshake_pair = headers.contains_key("sec-websocket-key")
            && headers.contains_key("sec-websocket-version");
        if upgrade_websocket || handshake_pair {
            return Self::WebSocket;
        }

        let accepts_event_stream = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("text/event-stream"));
        if *method == Method::GET && accepts_event_stream {
            return Self::Sse;
        }

        if *method == Method::POST {
            return Self::JsonRpc;
        }

        Self::Unsupported
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // OAuth discovery and flow
        .route("/.well-known/oauth-authorization-server", get(handlers::handle_auth_server_metadata))
        .route("/.well-known/oauth-protected-resource", get(handlers::handle_protected_resource))
        .route("/register", post(handlers::handle_register))
        .route("/authorize", get(bridge::handle_authorize_get).post(bridge::handle_authorize_post))
        .route("/callback", get(bridge::handle_callback))
        .route("/token", post(grants::handle_token))
        // MCP endpoint, protocol chosen per request
        .route("/mcp", any(handle_mcp))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Entry point for `/mcp`: classify and hand off.
async fn handle_mcp(State(state): State<Arc<HttpState>>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    match Protocol::classify(&parts.method, &parts.headers) {
        Protocol::WebSocket => {
            match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
                Ok(upgrade) => ws::serve(state, upgrade, &parts.headers),
                Err(_) => ws::upgrade_required(),
            }
        }
        Protocol::Sse => handle_sse(&state),
        Protocol::JsonRpc => {
            let body = match axum::body::to_bytes(body, 2 * 1024 * 1024).await {
                Ok(bytes) => bytes,
                Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
            };
            handle_rpc_post(&state, &parts.headers, &body).await
        }
        Protocol::Unsupported => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Handle a JSON-RPC message POSTed to `/mcp`.
async fn handle_rpc_post(state: &Arc<HttpState>, headers: &HeaderMap, body: &Bytes) -> Response {
    let origin = request_origin(headers, &state.config);

    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(error = %error, "unparseable JSON-RPC body");
            return Json(JsonRpcResponse::error(None, -32700, "Parse error")).into_response();
        }
    };

    let auth = match bearer_token(headers) {
        Some(token) => match state.oauth.validate_access_token(token).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(error = %error, "access token validation failed");
                None
            }
        },
        None => None,
    };

    match dispatch_rpc(state, request, auth.as_ref(), &origin).await {
        RpcOutcome::Reply(response) => Json(response).into_response(),
        RpcOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        RpcOutcome::Unauthorized(response) => {
            let challenge = format!(
                r#"Bearer resource_metadata="{origin}/.well-known/oauth-protected-resource""#
            );
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, challenge)],
                Json(response),
            )
                .into_response()
        }
    }
}

/// Transport-agnostic result of dispatching one JSON-RPC message.
#[derive(Debug)]
pub enum RpcOutcome {
    Reply(JsonRpcResponse),
    /// Notification; HTTP answers `202 Accepted`, WebSocket stays silent.
    Accepted,
    /// Reply carrying `-32001`; HTTP adds `401` + `WWW-Authenticate`.
    Unauthorized(JsonRpcResponse),
}

/// Methods that work without a bearer token, so clients can complete the MCP
/// handshake and discover tools before authorizing.
fn is_soft_auth(method: &str) -> bool {
    matches!(
        method,
        "initialize"
            | "initialized"
            | "notifications/initialized"
            | "notifications/cancelled"
            | "ping"
            | "tools/list"
            | "resources/list"
            | "prompts/list"
    )
}

/// Dispatch one JSON-RPC message. Shared by the POST and WebSocket paths.
pub async fn dispatch_rpc(
    state: &HttpState,
    request: JsonRpcRequest,
    auth: Option<&AccessTokenRecord>,
    origin: &str,
) -> RpcOutcome {
    tracing::debug!(method = %request.method, authenticated = auth.is_some(), "dispatching JSON-RPC message");

    if !is_soft_auth(&request.method) && auth.is_none() {
        return RpcOutcome::Unauthorized(unauthorized_response(request.id, origin));
    }

    let is_notification = request.id.is_none();

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(request.id, initialize_result(&request.params)),
        "notifications/initialized" | "initialized" | "notifications/cancelled" => {
            if is_notification {
                return RpcOutcome::Accepted;
            }
            JsonRpcResponse::success(request.id, serde_json::json!({}))
        }
        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
        "tools/list" => tools_list_response(request.id, &state.tools),
        "resources/list" => {
            JsonRpcResponse::success(request.id, serde_json::json!({ "resources": [] }))
        }
        "prompts/list" => {
            JsonRpcResponse::success(request.id, serde_json::json!({ "prompts": [] }))
        }
        "tools/call" => {
            let Some(record) = auth else {
                return RpcOutcome::Unauthorized(unauthorized_response(request.id, origin));
            };
            handle_tools_call(request.id, &request.params, state, record).await
        }
        _ => {
            if is_notification {
                return RpcOutcome::Accepted;
            }
            JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            )
        }
    };

    RpcOutcome::Reply(response)
}

fn unauthorized_response(id: Option<serde_json::Value>, origin: &str) -> JsonRpcResponse {
    JsonRpcResponse::error_with_data(
        id,
        -32001,
        "Authorization required",
        serde_json::json!({ "authorization_url": format!("{origin}/authorize") }),
    )
}

fn initialize_result(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(|value| value.as_str())
        .unwrap_or("2024-11-05");

    tracing::info!(protocol_version = %protocol_version, "MCP initialize");

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tools_list_response(
    id: Option<serde_json::Value>,
    tools: &[Box<dyn McpTool>],
) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|tool| McpToolInfo {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
}

async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    state: &HttpState,
    record: &AccessTokenRecord,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|value| value.as_str()) else {
        return JsonRpcResponse::error(id, -32602, "Missing 'name' parameter");
    };

    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let Some(tool) = state.tools.iter().find(|tool| tool.name() == tool_name) else {
        return JsonRpcResponse::error(id, -32602, format!("Tool not found: {tool_name}"));
    };

    let ctx = ToolContext { graph: Arc::clone(&state.graph), props: record.props.clone() };

    tracing::info!(tool = %tool_name, user_id = %record.user_id, "executing tool");

    match tool.execute(&ctx, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            }),
        ),
        Err(e) => {
            tracing::error!(tool = %tool_name, error = %e, "tool execution failed");
            JsonRpcResponse::error(id, -32000, e.to_user_message())
        }
    }
}

/// SSE bootstrap stream: clients that connect this way get the handshake
/// pushed proactively, then keepalives until the idle ceiling closes the
/// stream and the client reconnects.
fn handle_sse(state: &Arc<HttpState>) -> Response {
    tracing::info!("new SSE stream connection");

    let initialize = JsonRpcResponse::success(
        Some(serde_json::json!(0)),
        initialize_result(&serde_json::json!({})),
    );
    let tools = tools_list_response(Some(serde_json::json!(1)), &state.tools);
    let ceiling = state.config.sse_idle_timeout;
    let heartbeat = state.config.sse_heartbeat;

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(
            Event::default().data(serde_json::to_string(&initialize).unwrap_or_default()),
        );
        yield Ok(Event::default().data(serde_json::to_string(&tools).unwrap_or_default()));
        // Hold the stream open for keepalives, then end it so proxies and
        // clients never sit on a stale connection.
        tokio::time::sleep(ceiling).await;
    };

    (
        [
            ("X-Accel-Buffering", "no"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(heartbeat).text("ping")),
    )
        .into_response()
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}
