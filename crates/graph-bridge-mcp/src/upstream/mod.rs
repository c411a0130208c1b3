//! Token exchange against the Microsoft identity platform.
//!
//! The bridge never inspects upstream tokens; whatever the IdP returns is
//! carried opaquely in grant props. Exchange calls are made exactly once per
//! grant because authorization codes (and rotated refresh tokens) are
//! single-use upstream.

use serde::Deserialize;

use crate::config::Config;
use crate::error::{ExchangeError, ExchangeResult};

/// Token response from the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamTokens {
    /// Bearer token for Microsoft Graph.
    pub access_token: String,

    /// Token type, normally `Bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime in seconds, if the IdP reported one.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Refresh token, present when `offline_access` was granted.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Scopes actually granted.
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Confidential OAuth client for the upstream token endpoint.
pub struct TokenExchanger {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl TokenExchanger {
    /// Create an exchanger for the configured Entra application.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> ExchangeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            token_endpoint: config.token_endpoint(),
            client_id: config.upstream_client_id.clone(),
            client_secret: config.upstream_client_secret.clone(),
            scope: config.scope.clone(),
        })
    }

    /// Redeem an upstream authorization code for tokens.
    ///
    /// `redirect_uri` must be the exact callback URI the code was issued for.
    ///
    /// # Errors
    ///
    /// Returns error if the IdP is unreachable or rejects the code. Callers
    /// must not retry: the code is burned either way.
    pub async fn redeem_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> ExchangeResult<UpstreamTokens> {
        tracing::debug!("redeeming upstream authorization code");
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request_tokens(&form).await
    }

    /// Exchange an upstream refresh token for a fresh token set.
    ///
    /// # Errors
    ///
    /// Returns error if the IdP is unreachable or the refresh token is no
    /// longer valid.
    pub async fn refresh(&self, refresh_token: &str) -> ExchangeResult<UpstreamTokens> {
        tracing::debug!("refreshing upstream tokens");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        self.request_tokens(&form).await
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> ExchangeResult<UpstreamTokens> {
        let response = self.http.post(&self.token_endpoint).form(form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        if let Ok(err) = serde_json::from_str::<UpstreamErrorBody>(&body) {
            tracing::warn!(error = %err.error, "IdP rejected token request");
            return Err(ExchangeError::rejected(
                err.error,
                err.error_description.unwrap_or_default(),
            ));
        }

        Err(ExchangeError::UnexpectedStatus {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}
