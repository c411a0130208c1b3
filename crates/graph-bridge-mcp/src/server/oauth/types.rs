//! OAuth 2.0 types for the downstream authorization server.
//!
//! Everything here is persisted through the token store as JSON, so all types
//! are serde-tolerant: unknown fields are ignored and missing optional fields
//! default, letting records written by one server version be read by another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ClientKind;

/// Token endpoint authentication methods we accept at registration.
///
/// MCP clients are public clients, so `none` is the norm. Secret-based
/// registration is accepted and recorded, but the bridge never issues client
/// secrets, so such clients authenticate the same way in practice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEndpointAuthMethod {
    /// Public client, no credentials at the token endpoint.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Secret-carrying client.
    #[serde(rename = "client_secret_post", alias = "client_secret_basic")]
    Secret,
}

/// A registered downstream client.
///
/// Immutable once created, except that redirect URIs may be added: the static
/// alias client starts with an empty list and pins the first URI it sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Issued client id.
    pub client_id: String,

    /// Self-reported client name.
    #[serde(default)]
    pub client_name: Option<String>,

    /// Registered redirect URIs (exact-match validated).
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// How the client authenticates at the token endpoint.
    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Grant types the client may use.
    #[serde(default = "default_grant_types")]
    pub grant_types: Vec<String>,

    /// Response types the client may request.
    #[serde(default = "default_response_types")]
    pub response_types: Vec<String>,

    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

fn default_grant_types() -> Vec<String> {
    vec!["authorization_code".to_string(), "refresh_token".to_string()]
}

fn default_response_types() -> Vec<String> {
    vec!["code".to_string()]
}

impl ClientRecord {
    /// Check whether a redirect URI is registered for this client.
    #[must_use]
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

/// A validated authorization request, after parameter checks and client id
/// resolution. This is what survives the round trip to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Resolved downstream client id.
    pub client_id: String,

    /// Redirect URI the downstream code will be delivered to.
    pub redirect_uri: String,

    /// Scope the client asked for, if any.
    #[serde(default)]
    pub scope: Option<String>,

    /// Opaque client state, echoed back on the final redirect.
    #[serde(default)]
    pub state: Option<String>,

    /// PKCE code challenge.
    pub code_challenge: String,

    /// PKCE challenge method, always `S256`.
    pub code_challenge_method: String,
}

/// State carried through the upstream identity provider, sealed with the
/// signing secret so nothing in it can be tampered with in transit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    /// The downstream request being continued.
    #[serde(flatten)]
    pub request: AuthRequest,

    /// Classified client family.
    #[serde(default)]
    pub client_kind: ClientKind,

    /// When the state was sealed, for freshness checks.
    pub issued_at: DateTime<Utc>,
}

/// Per-grant properties the bridge attaches to codes, tokens, and refresh
/// grants. Upstream tokens are carried opaquely; the bridge never decodes
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrantProps {
    /// Upstream authorization code, present only between callback and the
    /// first token exchange.
    pub upstream_code: Option<String>,

    /// Callback URI the upstream code was issued for.
    pub upstream_redirect_uri: Option<String>,

    /// Upstream access token for Graph calls.
    pub upstream_access_token: Option<String>,

    /// Upstream token type, normally `Bearer`.
    pub upstream_token_type: Option<String>,

    /// Scopes the IdP actually granted.
    pub upstream_scope: Option<String>,

    /// Upstream refresh token.
    pub upstream_refresh_token: Option<String>,

    /// Classified client family.
    pub client_kind: ClientKind,
}

/// A downstream authorization code awaiting exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCodeRecord {
    /// Client the code was issued to.
    pub client_id: String,

    /// Redirect URI the code was delivered to.
    pub redirect_uri: String,

    /// PKCE code challenge to verify at exchange.
    pub code_challenge: String,

    /// PKCE challenge method.
    pub code_challenge_method: String,

    /// Downstream scope granted.
    pub scope: String,

    /// Synthetic user id for this authorization.
    pub user_id: String,

    /// Grant props, carrying the upstream code.
    pub props: GrantProps,

    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// A live downstream access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    /// Client the token was issued to.
    pub client_id: String,

    /// Synthetic user id.
    pub user_id: String,

    /// Downstream scope granted.
    pub scope: String,

    /// Grant props, carrying the upstream access token.
    pub props: GrantProps,

    /// Lifetime in seconds.
    pub expires_in: u64,

    /// Issue time.
    pub created_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    /// Check if the token has expired. The store TTL normally enforces this;
    /// the wall-clock check covers backends without expiry. Negative ages
    /// (clock skew) count as fresh.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at).num_seconds();
        age >= 0 && age.unsigned_abs() >= self.expires_in
    }
}

/// A downstream refresh grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshGrantRecord {
    /// Client the grant belongs to.
    pub client_id: String,

    /// Synthetic user id.
    pub user_id: String,

    /// Downstream scope granted.
    pub scope: String,

    /// Grant props, carrying the upstream refresh token.
    pub props: GrantProps,

    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// A token pair returned from token creation or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Downstream access token.
    pub access_token: String,

    /// Downstream refresh token.
    pub refresh_token: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Downstream scope granted.
    pub scope: String,
}
