//! MCP endpoint tests: protocol selection on `/mcp` and the soft-auth
//! boundary of the JSON-RPC dispatcher.
//!
//! No IdP or Graph traffic happens here; handshake and discovery methods must
//! work without any token at all.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use graph_bridge_mcp::config::Config;
use graph_bridge_mcp::graph::GraphClient;
use graph_bridge_mcp::server::oauth::OAuthStore;
use graph_bridge_mcp::server::transport::{HttpState, create_router};
use graph_bridge_mcp::store::{KvStore, MemoryKvStore};
use graph_bridge_mcp::tools;
use graph_bridge_mcp::upstream::TokenExchanger;

fn build_test_router() -> axum::Router {
    let config = Config::for_testing("http://unused.localhost");
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let oauth = OAuthStore::new(Arc::clone(&kv), &config);
    let exchanger = TokenExchanger::new(&config).unwrap();
    let graph = Arc::new(GraphClient::new(&config, kv).unwrap());
    let tools = tools::register_all_tools();

    create_router(Arc::new(HttpState { config, oauth, exchanger, graph, tools }))
}

async fn post_rpc(app: &axum::Router, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_initialize_without_auth() {
    let app = build_test_router();

    let response = post_rpc(
        &app,
        json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {"protocolVersion": "2025-06-18"},
            "id": 1
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(body["result"]["serverInfo"]["name"], "graph-bridge-mcp");
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_initialize_defaults_protocol_version() {
    let app = build_test_router();

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "initialize", "id": 1})).await;

    let body = json_body(response).await;
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_tools_list_without_auth() {
    let app = build_test_router();

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "tools/list", "id": 7})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let tool_list = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tool_list.len(), 8);

    let names: Vec<&str> = tool_list.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"get_profile"));
    assert!(names.contains(&"send_mail"));
    assert!(tool_list.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn test_tools_call_requires_auth() {
    let app = build_test_router();

    let response = post_rpc(
        &app,
        json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {"name": "get_profile", "arguments": {}},
            "id": 2
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get("WWW-Authenticate").unwrap().to_str().unwrap();
    assert!(challenge.starts_with("Bearer resource_metadata="));
    assert!(challenge.contains("/.well-known/oauth-protected-resource"));

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["error"]["message"], "Authorization required");
    assert_eq!(body["error"]["data"]["authorization_url"], "http://localhost:8080/authorize");
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_invalid_bearer_token_still_serves_open_methods() {
    let app = build_test_router();

    let request = Request::post("/mcp")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer not-a-real-token")
        .body(Body::from(
            json!({"jsonrpc": "2.0", "method": "tools/list", "id": 1}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The same bogus token does not open protected methods
    let request = Request::post("/mcp")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer not-a-real-token")
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "get_profile"},
                "id": 2
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resources_and_prompts_are_empty() {
    let app = build_test_router();

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "resources/list", "id": 1})).await;
    assert_eq!(json_body(response).await["result"]["resources"], json!([]));

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "prompts/list", "id": 2})).await;
    assert_eq!(json_body(response).await["result"]["prompts"], json!([]));
}

#[tokio::test]
async fn test_notifications_get_accepted() {
    let app = build_test_router();

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Unknown notifications are swallowed too
    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "notifications/whatever"})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_unknown_method_with_id() {
    let app = build_test_router();

    let response =
        post_rpc(&app, json!({"jsonrpc": "2.0", "method": "no/such/method", "id": 3})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test]
async fn test_unparseable_body_is_parse_error() {
    let app = build_test_router();

    let response = app
        .clone()
        .oneshot(
            Request::post("/mcp")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_plain_get_is_method_not_allowed() {
    let app = build_test_router();

    let response =
        app.clone().oneshot(Request::get("/mcp").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_degraded_websocket_handshake_gets_426() {
    let app = build_test_router();

    // Upgrade intent without the key/version pair
    let response = app
        .clone()
        .oneshot(
            Request::get("/mcp")
                .header("Connection", "Upgrade")
                .header("Upgrade", "websocket")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    assert_eq!(response.headers().get("Upgrade").unwrap(), "websocket");
}

#[tokio::test]
async fn test_sse_stream_bootstraps_session() {
    let app = build_test_router();

    let response = app
        .clone()
        .oneshot(
            Request::get("/mcp")
                .header("Accept", "text/event-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(response.headers().get("X-Accel-Buffering").unwrap(), "no");

    // for_testing shortens the idle ceiling, so the whole stream can be read
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("serverInfo"));
    assert!(text.contains("get_profile"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response =
        app.clone().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "graph-bridge-mcp");
}
