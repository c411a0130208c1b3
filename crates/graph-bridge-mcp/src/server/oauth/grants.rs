//! Token endpoint and the upstream exchange performed inside each grant.
//!
//! Redeeming a downstream grant is the moment the bridge talks to the
//! identity provider: an authorization-code grant redeems the stored upstream
//! code, a refresh grant exchanges the stored upstream refresh token. The
//! resulting IdP tokens are split between the new access token (which carries
//! the Graph access token) and the new refresh grant (which carries only the
//! Graph refresh token).

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::alias::resolve_client_id;
use super::pkce;
use super::types::{GrantProps, TokenPair};
use crate::error::{BridgeError, BridgeResult};
use crate::server::transport::HttpState;
use crate::upstream::{TokenExchanger, UpstreamTokens};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
}

/// Props for the two tokens minted from one upstream exchange.
#[derive(Debug)]
pub struct BridgedGrant {
    pub access_props: GrantProps,
    pub refresh_props: GrantProps,
    pub expires_in: u64,
}

/// `POST /token`
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<TokenRequest>,
) -> Response {
    let result = match form.grant_type.as_deref() {
        Some("authorization_code") => authorization_code_grant(&state, &form).await,
        Some("refresh_token") => refresh_token_grant(&state, &form).await,
        other => Err(BridgeError::unsupported_grant_type(other.unwrap_or("<missing>"))),
    };
    result.unwrap_or_else(|error| error.into_response())
}

async fn authorization_code_grant(
    state: &HttpState,
    form: &TokenRequest,
) -> BridgeResult<Response> {
    let code = form
        .code
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing code"))?;
    let verifier = form
        .code_verifier
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing code_verifier"))?;

    let record = state
        .oauth
        .consume_auth_code(code)
        .await?
        .ok_or_else(|| BridgeError::invalid_grant("unknown or expired authorization code"))?;

    if let Some(client_id) = form.client_id.as_deref().filter(|value| !value.is_empty()) {
        let resolved =
            resolve_client_id(&state.oauth, &state.config.static_client_id, client_id).await?;
        if resolved != record.client_id {
            return Err(BridgeError::invalid_grant("code was issued to a different client"));
        }
    }

    if let Some(redirect_uri) = form.redirect_uri.as_deref().filter(|value| !value.is_empty())
        && redirect_uri != record.redirect_uri
    {
        return Err(BridgeError::invalid_grant(
            "redirect_uri does not match the authorization request",
        ));
    }

    if !pkce::verify_s256(verifier, &record.code_challenge) {
        return Err(BridgeError::invalid_grant("PKCE verification failed"));
    }

    let bridged = exchange_for_grant(
        &state.exchanger,
        "authorization_code",
        record.props,
        state.config.access_token_ttl,
    )
    .await?;

    let pair = state
        .oauth
        .create_token_pair(
            &record.client_id,
            &record.user_id,
            &record.scope,
            bridged.access_props,
            bridged.refresh_props,
            bridged.expires_in,
        )
        .await?;

    tracing::info!(client_id = %record.client_id, "issued tokens for authorization code");
    Ok(token_success(&pair))
}

async fn refresh_token_grant(state: &HttpState, form: &TokenRequest) -> BridgeResult<Response> {
    let refresh_token = form
        .refresh_token
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing refresh_token"))?;

    let grant = state
        .oauth
        .get_refresh_grant(refresh_token)
        .await?
        .ok_or_else(|| BridgeError::invalid_grant("unknown or expired refresh token"))?;

    if let Some(client_id) = form.client_id.as_deref().filter(|value| !value.is_empty()) {
        let resolved =
            resolve_client_id(&state.oauth, &state.config.static_client_id, client_id).await?;
        if resolved != grant.client_id {
            return Err(BridgeError::invalid_grant(
                "refresh token was issued to a different client",
            ));
        }
    }

    let bridged = exchange_for_grant(
        &state.exchanger,
        "refresh_token",
        grant.props.clone(),
        state.config.access_token_ttl,
    )
    .await?;

    // The old grant outlives a failed exchange; it is only retired here,
    // after the IdP has accepted the rotation.
    state.oauth.delete_refresh_grant(refresh_token).await?;

    let pair = state
        .oauth
        .create_token_pair(
            &grant.client_id,
            &grant.user_id,
            &grant.scope,
            bridged.access_props,
            bridged.refresh_props,
            bridged.expires_in,
        )
        .await?;

    tracing::info!(client_id = %grant.client_id, "rotated refresh grant");
    Ok(token_success(&pair))
}

/// Perform the upstream exchange appropriate for `grant_type` and split the
/// result into access and refresh props.
///
/// Grant types other than `authorization_code` and `refresh_token` pass their
/// props through unchanged.
///
/// # Errors
///
/// Returns error if the props lack the upstream material the grant type needs
/// or the exchange itself fails.
pub async fn exchange_for_grant(
    exchanger: &TokenExchanger,
    grant_type: &str,
    props: GrantProps,
    fallback_ttl: u64,
) -> BridgeResult<BridgedGrant> {
    match grant_type {
        "authorization_code" => {
            let code = props
                .upstream_code
                .clone()
                .ok_or_else(|| BridgeError::invalid_grant("grant holds no upstream code"))?;
            let redirect_uri = props.upstream_redirect_uri.clone().ok_or_else(|| {
                BridgeError::invalid_grant("grant holds no upstream redirect_uri")
            })?;
            let tokens = exchanger.redeem_code(&code, &redirect_uri).await?;
            Ok(split_tokens(props, tokens, fallback_ttl))
        }
        "refresh_token" => {
            let refresh = props.upstream_refresh_token.clone().ok_or_else(|| {
                BridgeError::invalid_grant("grant holds no upstream refresh token")
            })?;
            let tokens = exchanger.refresh(&refresh).await?;
            Ok(split_tokens(props, tokens, fallback_ttl))
        }
        _ => Ok(BridgedGrant {
            access_props: props.clone(),
            refresh_props: props,
            expires_in: fallback_ttl,
        }),
    }
}

/// Split one upstream token response into the props carried by the new
/// access token and the new refresh grant.
///
/// The access side gets the Graph access token and never the refresh token;
/// the refresh side gets only the refresh token. Providers that do not rotate
/// refresh tokens return none, in which case the one already held is kept.
fn split_tokens(base: GrantProps, tokens: UpstreamTokens, fallback_ttl: u64) -> BridgedGrant {
    let expires_in = tokens.expires_in.unwrap_or(fallback_ttl);
    let rotated_refresh = tokens.refresh_token.or_else(|| base.upstream_refresh_token.clone());

    let access_props = GrantProps {
        upstream_code: None,
        upstream_access_token: Some(tokens.access_token),
        upstream_token_type: Some(tokens.token_type),
        upstream_scope: tokens.scope.or_else(|| base.upstream_scope.clone()),
        upstream_refresh_token: None,
        ..base.clone()
    };
    let refresh_props = GrantProps {
        upstream_code: None,
        upstream_access_token: None,
        upstream_token_type: None,
        upstream_refresh_token: rotated_refresh,
        ..base
    };

    BridgedGrant { access_props, refresh_props, expires_in }
}

/// Token responses must not be cached by intermediaries (RFC 6749 §5.1).
fn token_success(pair: &TokenPair) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(serde_json::json!({
            "access_token": pair.access_token,
            "token_type": "Bearer",
            "expires_in": pair.expires_in,
            "refresh_token": pair.refresh_token,
            "scope": pair.scope
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientKind;

    fn upstream_tokens(refresh: Option<&str>) -> UpstreamTokens {
        serde_json::from_value(serde_json::json!({
            "access_token": "graph-at",
            "token_type": "Bearer",
            "expires_in": 3599,
            "refresh_token": refresh,
            "scope": "User.Read Mail.Read"
        }))
        .unwrap()
    }

    fn code_props() -> GrantProps {
        GrantProps {
            upstream_code: Some("upstream-code".to_string()),
            upstream_redirect_uri: Some("https://bridge.example.com/callback".to_string()),
            client_kind: ClientKind::Claude,
            ..GrantProps::default()
        }
    }

    #[test]
    fn test_split_separates_access_and_refresh_material() {
        let bridged = split_tokens(code_props(), upstream_tokens(Some("graph-rt")), 3600);

        assert_eq!(bridged.expires_in, 3599);

        assert!(bridged.access_props.upstream_code.is_none());
        assert_eq!(bridged.access_props.upstream_access_token.as_deref(), Some("graph-at"));
        assert_eq!(bridged.access_props.upstream_token_type.as_deref(), Some("Bearer"));
        assert!(bridged.access_props.upstream_refresh_token.is_none());
        assert_eq!(bridged.access_props.client_kind, ClientKind::Claude);

        assert!(bridged.refresh_props.upstream_code.is_none());
        assert!(bridged.refresh_props.upstream_access_token.is_none());
        assert_eq!(bridged.refresh_props.upstream_refresh_token.as_deref(), Some("graph-rt"));
        assert_eq!(bridged.refresh_props.client_kind, ClientKind::Claude);
    }

    #[test]
    fn test_split_retains_refresh_token_when_not_rotated() {
        let base = GrantProps {
            upstream_refresh_token: Some("old-rt".to_string()),
            client_kind: ClientKind::Inspector,
            ..GrantProps::default()
        };
        let bridged = split_tokens(base, upstream_tokens(None), 3600);
        assert_eq!(bridged.refresh_props.upstream_refresh_token.as_deref(), Some("old-rt"));
    }

    #[test]
    fn test_split_uses_fallback_ttl_when_idp_omits_expiry() {
        let tokens: UpstreamTokens =
            serde_json::from_str(r#"{"access_token": "at"}"#).unwrap();
        let bridged = split_tokens(GrantProps::default(), tokens, 1234);
        assert_eq!(bridged.expires_in, 1234);
    }

    #[tokio::test]
    async fn test_other_grant_types_pass_props_through() {
        let config = crate::config::Config::for_testing("http://127.0.0.1:9");
        let exchanger = TokenExchanger::new(&config).unwrap();
        let props = GrantProps {
            upstream_access_token: Some("at".to_string()),
            upstream_scope: Some("User.Read".to_string()),
            ..GrantProps::default()
        };

        let bridged =
            exchange_for_grant(&exchanger, "client_credentials", props.clone(), 900)
                .await
                .unwrap();
        assert_eq!(bridged.access_props, props);
        assert_eq!(bridged.refresh_props, props);
        assert_eq!(bridged.expires_in, 900);
    }
}
