//! Configuration for the Graph bridge MCP server.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the Microsoft identity platform.
    pub const LOGIN_BASE: &str = "https://login.microsoftonline.com";

    /// Microsoft Graph v1.0 endpoint.
    pub const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";

    /// Multi-tenant login path segment.
    pub const DEFAULT_TENANT: &str = "common";

    /// Upstream scopes requested from the identity provider.
    ///
    /// `offline_access` is required for refresh tokens.
    pub const DEFAULT_SCOPE: &str = "openid profile email offline_access \
         User.Read Mail.Read Mail.Send Calendars.ReadWrite Contacts.Read Files.Read";

    /// Well-known client id some MCP clients send without registering first.
    pub const DEFAULT_STATIC_CLIENT_ID: &str = "claude";

    /// Request timeout for Graph calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Cache TTL for Graph read responses (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Lifetime of a downstream authorization code (10 minutes).
    pub const AUTH_CODE_TTL: Duration = Duration::from_secs(600);

    /// Access token lifetime in seconds when the IdP omits `expires_in`.
    pub const ACCESS_TOKEN_TTL: u64 = 3600;

    /// Lifetime of a downstream refresh grant (30 days).
    pub const REFRESH_GRANT_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

    /// Interval between SSE keepalive events.
    pub const SSE_HEARTBEAT: Duration = Duration::from_secs(15);

    /// Idle ceiling for an SSE stream (5 minutes).
    pub const SSE_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

    /// Idle ceiling for a WebSocket session (5 minutes).
    pub const WS_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
}

/// `$select` field sets for Graph requests.
pub mod fields {
    /// User profile fields.
    pub const USER: &[&str] =
        &["id", "displayName", "mail", "userPrincipalName", "jobTitle", "officeLocation"];

    /// Message list fields (token-efficient, no body).
    pub const MESSAGE: &[&str] = &[
        "id",
        "subject",
        "bodyPreview",
        "from",
        "receivedDateTime",
        "isRead",
        "hasAttachments",
        "webLink",
    ];

    /// Calendar event fields.
    pub const EVENT: &[&str] = &[
        "id",
        "subject",
        "start",
        "end",
        "location",
        "organizer",
        "isAllDay",
        "onlineMeeting",
        "webLink",
    ];

    /// Drive item fields.
    pub const DRIVE_ITEM: &[&str] =
        &["id", "name", "size", "webUrl", "lastModifiedDateTime", "folder", "file"];

    /// Contact fields.
    pub const CONTACT: &[&str] =
        &["id", "displayName", "emailAddresses", "mobilePhone", "companyName"];
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public origin of this server, e.g. `https://graph-mcp.example.com`.
    pub base_url: String,

    /// Entra tenant id, or `common` for multi-tenant sign-in.
    pub tenant_id: String,

    /// Application (client) id registered in Entra.
    pub upstream_client_id: String,

    /// Client secret for the Entra application.
    pub upstream_client_secret: String,

    /// Scopes requested from the identity provider.
    pub scope: String,

    /// Well-known downstream client id served by the static alias.
    pub static_client_id: String,

    /// HMAC key for state blobs and approval cookies.
    pub signing_secret: String,

    /// Base URL for the identity provider (for testing with mock servers).
    pub login_url: String,

    /// Base URL for Microsoft Graph (for testing with mock servers).
    pub graph_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Cache TTL for Graph reads.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Downstream authorization code lifetime.
    pub auth_code_ttl: Duration,

    /// Fallback access token lifetime in seconds.
    pub access_token_ttl: u64,

    /// Downstream refresh grant lifetime.
    pub refresh_grant_ttl: Duration,

    /// Interval between SSE keepalive events.
    pub sse_heartbeat: Duration,

    /// Idle ceiling for an SSE stream.
    pub sse_idle_timeout: Duration,

    /// Idle ceiling for a WebSocket session.
    pub ws_idle_timeout: Duration,
}

impl Config {
    /// Create a new configuration for the given Entra application.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        tenant_id: impl Into<String>,
        upstream_client_id: impl Into<String>,
        upstream_client_secret: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            upstream_client_id: upstream_client_id.into(),
            upstream_client_secret: upstream_client_secret.into(),
            scope: api::DEFAULT_SCOPE.to_string(),
            static_client_id: api::DEFAULT_STATIC_CLIENT_ID.to_string(),
            signing_secret: signing_secret.into(),
            login_url: api::LOGIN_BASE.to_string(),
            graph_url: api::GRAPH_API.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            auth_code_ttl: api::AUTH_CODE_TTL,
            access_token_ttl: api::ACCESS_TOKEN_TTL,
            refresh_grant_ttl: api::REFRESH_GRANT_TTL,
            sse_heartbeat: api::SSE_HEARTBEAT,
            sse_idle_timeout: api::SSE_IDLE_TIMEOUT,
            ws_idle_timeout: api::WS_IDLE_TIMEOUT,
        }
    }

    /// Create a test configuration pointing IdP and Graph at a mock server.
    #[must_use]
    pub fn for_testing(mock_url: &str) -> Self {
        let mut config = Self::new(
            "http://localhost:8080",
            "test-tenant",
            "upstream-client-id",
            "upstream-client-secret",
            "test-signing-secret-at-least-32-bytes",
        );
        config.login_url = mock_url.to_string();
        config.graph_url = format!("{mock_url}/v1.0");
        config.request_timeout = Duration::from_secs(5);
        config.connect_timeout = Duration::from_secs(2);
        config.cache_ttl = Duration::from_secs(0); // No caching in tests
        config.cache_max_size = 0;
        config.sse_heartbeat = Duration::from_millis(50);
        config.sse_idle_timeout = Duration::from_millis(200);
        config.ws_idle_timeout = Duration::from_millis(200);
        config
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable (`ENTRA_CLIENT_ID`,
    /// `ENTRA_CLIENT_SECRET`, `BRIDGE_SIGNING_SECRET`) is missing.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("MCP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let tenant_id =
            std::env::var("ENTRA_TENANT_ID").unwrap_or_else(|_| api::DEFAULT_TENANT.to_string());
        let client_id = std::env::var("ENTRA_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("ENTRA_CLIENT_ID is required"))?;
        let client_secret = std::env::var("ENTRA_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("ENTRA_CLIENT_SECRET is required"))?;
        let signing_secret = std::env::var("BRIDGE_SIGNING_SECRET")
            .map_err(|_| anyhow::anyhow!("BRIDGE_SIGNING_SECRET is required"))?;

        let mut config = Self::new(base_url, tenant_id, client_id, client_secret, signing_secret);
        if let Ok(scope) = std::env::var("GRAPH_SCOPES") {
            config.scope = scope;
        }
        if let Ok(id) = std::env::var("STATIC_CLIENT_ID") {
            config.static_client_id = id;
        }
        Ok(config)
    }

    /// Upstream authorization endpoint for the configured tenant.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.login_url, self.tenant_id)
    }

    /// Upstream token endpoint for the configured tenant.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_url, self.tenant_id)
    }

    /// Callback URI this server registers with the identity provider.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.base_url)
    }
}
