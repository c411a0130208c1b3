//! OAuth discovery and registration endpoints.
//!
//! Implements:
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//!
//! The authorization and token endpoints themselves live in
//! [`super::bridge`] and [`super::grants`].

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::types::TokenEndpointAuthMethod;
use crate::config::Config;
use crate::server::transport::HttpState;

/// Origin to advertise in metadata documents.
///
/// Derived from the incoming `Host` (plus `X-Forwarded-Proto` behind a
/// proxy) so one deployment answers correctly on every hostname it serves.
/// Falls back to the configured base URL when no `Host` arrived.
pub fn request_origin(headers: &HeaderMap, config: &Config) -> String {
    let Some(host) = headers.get(header::HOST).and_then(|value| value.to_str().ok()) else {
        return config.base_url.clone();
    };

    let forwarded = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').next().unwrap_or(value).trim().to_string());

    let scheme = forwarded.unwrap_or_else(|| {
        if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
            "http".to_string()
        } else {
            "https".to_string()
        }
    });

    format!("{scheme}://{host}")
}

// ─── RFC 9728: Protected Resource Metadata ───────────────────────────────────

/// `GET /.well-known/oauth-protected-resource`
///
/// Tells clients where to find the authorization server for this resource.
pub async fn handle_protected_resource(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let origin = request_origin(&headers, &state.config);
    Json(serde_json::json!({
        "resource": origin,
        "authorization_servers": [origin],
        "bearer_methods_supported": ["header"],
        "scopes_supported": ["mcp"]
    }))
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities.
pub async fn handle_auth_server_metadata(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let origin = request_origin(&headers, &state.config);
    Json(serde_json::json!({
        "issuer": origin,
        "authorization_endpoint": format!("{origin}/authorize"),
        "token_endpoint": format!("{origin}/token"),
        "registration_endpoint": format!("{origin}/register"),
        "scopes_supported": ["mcp"],
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "token_endpoint_auth_methods_supported": ["none"],
        "code_challenge_methods_supported": ["S256"]
    }))
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub client_name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
}

/// `POST /register`
///
/// Register a new OAuth client dynamically.
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let redirect_uris = req.redirect_uris.unwrap_or_default();
    if redirect_uris.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_client_metadata",
                "error_description": "redirect_uris is required"
            })),
        )
            .into_response();
    }

    let grant_types = if req.grant_types.is_empty() {
        vec!["authorization_code".to_string(), "refresh_token".to_string()]
    } else {
        req.grant_types
    };
    let response_types = if req.response_types.is_empty() {
        vec!["code".to_string()]
    } else {
        req.response_types
    };

    let client = match state
        .oauth
        .register_client(
            req.client_name,
            redirect_uris,
            req.token_endpoint_auth_method,
            grant_types,
            response_types,
        )
        .await
    {
        Ok(client) => client,
        Err(error) => {
            tracing::error!(error = %error, "client registration failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "server_error",
                    "error_description": "registration could not be persisted"
                })),
            )
                .into_response();
        }
    };

    tracing::info!(client_id = %client.client_id, "registered OAuth client");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "client_id": client.client_id,
            "client_name": client.client_name,
            "redirect_uris": client.redirect_uris,
            "grant_types": client.grant_types,
            "response_types": client.response_types,
            "token_endpoint_auth_method": client.token_endpoint_auth_method
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> Config {
        Config::for_testing("http://127.0.0.1:9")
    }

    #[test]
    fn test_origin_from_host_defaults_to_https() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("bridge.example.com"));
        assert_eq!(request_origin(&headers, &config()), "https://bridge.example.com");
    }

    #[test]
    fn test_origin_localhost_defaults_to_http() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8080"));
        assert_eq!(request_origin(&headers, &config()), "http://localhost:8080");

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("127.0.0.1:3000"));
        assert_eq!(request_origin(&headers, &config()), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_origin_honors_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8080"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_origin(&headers, &config()), "https://localhost:8080");
    }

    #[test]
    fn test_origin_takes_first_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("bridge.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http, https"));
        assert_eq!(request_origin(&headers, &config()), "http://bridge.example.com");
    }

    #[test]
    fn test_origin_without_host_uses_configured_base() {
        let headers = HeaderMap::new();
        assert_eq!(request_origin(&headers, &config()), "http://localhost:8080");
    }
}
