//! Error types for the Graph bridge MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors from the Microsoft Graph client layer.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by Microsoft Graph (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Bridged access token rejected (401 response)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message from Graph
        message: String,
    },

    /// Token valid but lacks a required scope (403 response)
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message from Graph
        message: String,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from Graph
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl GraphError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_) | Self::Server { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Errors from token exchanges against the upstream identity provider.
///
/// These calls are never retried automatically: an authorization code is
/// single-use, and a blind retry would burn it.
#[derive(thiserror::Error, Debug)]
pub enum ExchangeError {
    /// HTTP transport error reaching the identity provider
    #[error("IdP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity provider rejected the grant
    #[error("IdP rejected grant ({error}): {description}")]
    Rejected {
        /// OAuth error code from the IdP
        error: String,
        /// Human-readable description from the IdP
        description: String,
    },

    /// Token endpoint returned a status we could not interpret
    #[error("IdP returned unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Token response body did not parse
    #[error("Failed to parse IdP response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ExchangeError {
    /// Create a rejection error from an IdP error payload.
    #[must_use]
    pub fn rejected(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Rejected { error: error.into(), description: description.into() }
    }
}

/// Errors from the token store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Stored value failed to serialize or deserialize
    #[error("Store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend failure (unreachable, corrupt, etc.)
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Errors surfaced by the downstream OAuth endpoints.
///
/// Each variant maps to an OAuth-style JSON error body so `/authorize`,
/// `/callback`, and `/token` fail the same way regardless of which layer
/// produced the error.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// Request is missing or malformed parameters
    #[error("{0}")]
    InvalidRequest(String),

    /// Client is unknown or the redirect URI is not registered
    #[error("{0}")]
    InvalidClient(String),

    /// Callback state is missing, unverifiable, or expired
    #[error("{0}")]
    InvalidState(String),

    /// Callback arrived without an authorization code
    #[error("no authorization code in callback")]
    MissingCode,

    /// Authorization code or refresh token is invalid, expired, or reused
    #[error("{0}")]
    InvalidGrant(String),

    /// Token request used a grant type we do not issue
    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Client registration could not be completed
    #[error("client registration failed: {0}")]
    Registration(String),

    /// The upstream identity provider refused the exchange
    #[error("upstream exchange failed: {0}")]
    Upstream(#[from] ExchangeError),

    /// Token store failure
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// Anything else that should not leak details to the client
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid client error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient(message.into())
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an invalid grant error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant(message.into())
    }

    /// Create an unsupported grant type error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType(grant_type.into())
    }

    /// Create a registration error.
    #[must_use]
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration(message.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The OAuth error code for the JSON `error` field.
    #[must_use]
    pub const fn oauth_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidState(_) => "invalid_state",
            Self::MissingCode => "missing_code",
            Self::InvalidGrant(_) | Self::Upstream(_) => "invalid_grant",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::Registration(_) | Self::Store(_) | Self::Internal(_) => "server_error",
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Registration(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "OAuth endpoint failure");
        } else {
            tracing::debug!(error = %self, "rejected OAuth request");
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.oauth_code(),
                "error_description": self.to_string()
            })),
        )
            .into_response()
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from the Graph client
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal tool logic error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Resource not available
    #[error("Resource unavailable: {0}")]
    Unavailable(String),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Convert to a user-friendly error message for MCP response.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Graph(GraphError::RateLimited { retry_after }) => {
                format!(
                    "Rate limited by Microsoft Graph. Please wait {:?} before retrying.",
                    retry_after
                )
            }
            Self::Graph(GraphError::Unauthorized { .. }) => {
                "Microsoft Graph rejected the linked account token. \
                 Please re-run the authorization flow."
                    .to_string()
            }
            Self::Graph(GraphError::Forbidden { message }) => {
                format!("Missing Microsoft Graph permission: {message}")
            }
            Self::Graph(GraphError::NotFound { resource }) => {
                format!("Not found: {resource}. Please check the identifier is correct.")
            }
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for Graph client operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for upstream token exchanges.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Result type alias for token store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for OAuth bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
