//! Authorization endpoints bridging downstream clients to the identity
//! provider.
//!
//! `/authorize` validates the downstream request, collects consent (once per
//! client, remembered in a signed cookie), and redirects the browser to the
//! upstream IdP with the whole downstream request sealed into the `state`
//! parameter. `/callback` verifies that state, binds the upstream code into a
//! downstream authorization code, and sends the browser back to the client.

use std::sync::Arc;

use axum::{
    Form,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;

use super::alias::{ensure_static_client, resolve_client_id};
use super::seal;
use super::types::{AuthCodeRecord, AuthRequest, AuthState, ClientRecord, GrantProps};
use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::models::ClientKind;
use crate::server::transport::HttpState;

/// Cookie remembering which client ids the user has approved.
const APPROVAL_COOKIE: &str = "mcp_approved_clients";

/// Downstream scope recorded when the client does not ask for one.
const DEFAULT_DOWNSTREAM_SCOPE: &str = "mcp";

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /authorize`
///
/// Shows the approval page, or goes straight upstream when this client was
/// approved before.
pub async fn handle_authorize_get(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    match begin_authorization(&state, jar, &params, false).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

/// `POST /authorize`
///
/// Form submission from the approval page: record the approval in the signed
/// cookie and continue upstream.
pub async fn handle_authorize_post(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
    Form(params): Form<AuthorizeParams>,
) -> Response {
    match begin_authorization(&state, jar, &params, true).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

/// `GET /callback`
///
/// Return leg from the identity provider.
pub async fn handle_callback(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match finish_authorization(&state, params).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn begin_authorization(
    state: &HttpState,
    jar: CookieJar,
    params: &AuthorizeParams,
    approve: bool,
) -> BridgeResult<Response> {
    // The static alias must exist before validation, even for clients that
    // skipped registration entirely.
    ensure_static_client(&state.oauth, &state.config.static_client_id).await?;

    let mut request = validate_authorize_params(params)?;
    request.client_id =
        resolve_client_id(&state.oauth, &state.config.static_client_id, &request.client_id)
            .await?;

    let record = state
        .oauth
        .get_client(&request.client_id)
        .await?
        .ok_or_else(|| BridgeError::invalid_client("unknown client_id"))?;

    if record.redirect_uris.is_empty() {
        // Alias-bootstrapped record: pin the first redirect URI it is used with
        state.oauth.add_redirect_uri(&request.client_id, &request.redirect_uri).await?;
    } else if !record.allows_redirect(&request.redirect_uri) {
        return Err(BridgeError::invalid_client("redirect_uri not registered for this client"));
    }

    let kind = ClientKind::detect(&request.redirect_uri);

    let mut approved_ids = approved_clients(&jar, &state.config.signing_secret);
    let already_approved = approved_ids.iter().any(|id| id == &request.client_id);

    if !already_approved && !approve {
        return Ok(approval_page(&record, &request, kind).into_response());
    }

    let jar = if approve && !already_approved {
        approved_ids.push(request.client_id.clone());
        jar.add(approval_cookie(&state.config.signing_secret, &approved_ids)?)
    } else {
        jar
    };

    let redirect = redirect_upstream(&state.config, &request, kind)?;
    Ok((jar, redirect).into_response())
}

async fn finish_authorization(
    state: &HttpState,
    params: CallbackParams,
) -> BridgeResult<Response> {
    let sealed = params
        .state
        .as_deref()
        .ok_or_else(|| BridgeError::invalid_state("missing state"))?;
    let auth_state: AuthState = seal::unseal(&state.config.signing_secret, sealed)
        .ok_or_else(|| BridgeError::invalid_state("state failed verification"))?;

    let age = Utc::now().signed_duration_since(auth_state.issued_at).num_seconds();
    if age > state.config.auth_code_ttl.as_secs() as i64 {
        return Err(BridgeError::invalid_state("state expired"));
    }

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "identity provider reported an authorization error"
        );
    }
    let upstream_code = params.code.ok_or(BridgeError::MissingCode)?;

    let request = auth_state.request;
    let record = AuthCodeRecord {
        client_id: request.client_id.clone(),
        redirect_uri: request.redirect_uri.clone(),
        code_challenge: request.code_challenge,
        code_challenge_method: request.code_challenge_method,
        scope: request
            .scope
            .clone()
            .unwrap_or_else(|| DEFAULT_DOWNSTREAM_SCOPE.to_string()),
        user_id: format!("user-{}", uuid::Uuid::new_v4()),
        props: GrantProps {
            upstream_code: Some(upstream_code),
            upstream_redirect_uri: Some(state.config.callback_url()),
            client_kind: auth_state.client_kind,
            ..GrantProps::default()
        },
        created_at: Utc::now(),
    };

    let code = state.oauth.create_auth_code(&record).await?;

    let mut location = url::Url::parse(&request.redirect_uri)
        .map_err(|_| BridgeError::invalid_state("stored redirect_uri is not a valid URL"))?;
    {
        let mut pairs = location.query_pairs_mut();
        pairs.append_pair("code", &code);
        if let Some(client_state) = request.state.as_deref() {
            pairs.append_pair("state", client_state);
        }
    }

    tracing::info!(client_id = %record.client_id, "issued downstream authorization code");
    Ok((StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response())
}

/// Validate raw authorize parameters into an [`AuthRequest`].
fn validate_authorize_params(params: &AuthorizeParams) -> BridgeResult<AuthRequest> {
    let client_id = params
        .client_id
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing client_id"))?;
    let redirect_uri = params
        .redirect_uri
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing redirect_uri"))?;

    url::Url::parse(redirect_uri)
        .map_err(|_| BridgeError::invalid_request("redirect_uri is not a valid URL"))?;

    if params.response_type.as_deref() != Some("code") {
        return Err(BridgeError::invalid_request("response_type must be 'code'"));
    }

    let code_challenge = params
        .code_challenge
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BridgeError::invalid_request("missing code_challenge"))?;

    // PKCE is mandatory and S256-only; default the method when omitted
    let method = params.code_challenge_method.as_deref().unwrap_or("S256");
    if method != "S256" {
        return Err(BridgeError::invalid_request("code_challenge_method must be 'S256'"));
    }

    Ok(AuthRequest {
        client_id: client_id.to_string(),
        redirect_uri: redirect_uri.to_string(),
        scope: params.scope.clone().filter(|value| !value.is_empty()),
        state: params.state.clone(),
        code_challenge: code_challenge.to_string(),
        code_challenge_method: "S256".to_string(),
    })
}

/// Build the redirect into the upstream authorization endpoint with the
/// downstream request sealed into `state`.
fn redirect_upstream(
    config: &Config,
    request: &AuthRequest,
    kind: ClientKind,
) -> BridgeResult<Response> {
    let auth_state =
        AuthState { request: request.clone(), client_kind: kind, issued_at: Utc::now() };
    let sealed = seal::seal(&config.signing_secret, &auth_state)
        .map_err(|e| BridgeError::internal(e.to_string()))?;

    let mut url = url::Url::parse(&config.authorize_endpoint())
        .map_err(|e| BridgeError::internal(format!("bad upstream authorize endpoint: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.upstream_client_id)
        .append_pair("response_type", "code")
        .append_pair("response_mode", "query")
        .append_pair("redirect_uri", &config.callback_url())
        .append_pair("scope", &config.scope)
        .append_pair("state", &sealed);

    tracing::info!(client_id = %request.client_id, client_kind = ?kind, "redirecting to identity provider");
    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}

/// Client ids the user has previously approved, from the signed cookie.
/// A missing or unverifiable cookie reads as no approvals.
fn approved_clients(jar: &CookieJar, secret: &str) -> Vec<String> {
    jar.get(APPROVAL_COOKIE)
        .and_then(|cookie| seal::unseal(secret, cookie.value()))
        .unwrap_or_default()
}

fn approval_cookie(secret: &str, approved: &[String]) -> BridgeResult<Cookie<'static>> {
    let sealed = seal::seal(secret, &approved.to_vec())
        .map_err(|e| BridgeError::internal(e.to_string()))?;
    Ok(Cookie::build((APPROVAL_COOKIE, sealed))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build())
}

/// Render the consent page. All request parameters ride along as hidden form
/// fields and are re-validated on submit.
fn approval_page(client: &ClientRecord, request: &AuthRequest, kind: ClientKind) -> Html<String> {
    let client_label = client
        .client_name
        .clone()
        .unwrap_or_else(|| kind.display_name().to_string());

    let mut hidden = String::new();
    let mut field = |name: &str, value: &str| {
        hidden.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
            html_escape(name),
            html_escape(value)
        ));
    };
    field("client_id", &request.client_id);
    field("redirect_uri", &request.redirect_uri);
    field("response_type", "code");
    field("code_challenge", &request.code_challenge);
    field("code_challenge_method", &request.code_challenge_method);
    if let Some(scope) = request.scope.as_deref() {
        field("scope", scope);
    }
    if let Some(state) = request.state.as_deref() {
        field("state", state);
    }

    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Authorize {client}</title>
<style>
  body {{ font-family: system-ui, sans-serif; max-width: 26rem; margin: 4rem auto; padding: 0 1rem; color: #1a1a1a; }}
  .card {{ border: 1px solid #ddd; border-radius: 8px; padding: 1.5rem; }}
  .uri {{ color: #555; font-size: 0.85rem; word-break: break-all; }}
  button {{ background: #2563eb; color: white; border: none; border-radius: 6px; padding: 0.6rem 1.4rem; font-size: 1rem; cursor: pointer; }}
</style>
</head>
<body>
<div class="card">
  <h1>Connect {client}</h1>
  <p><strong>{client}</strong> is asking to use your Microsoft account through this server. You will sign in with Microsoft next.</p>
  <p class="uri">Results will be sent to:<br>{redirect}</p>
  <form method="post" action="/authorize">
{hidden}    <button type="submit">Approve and continue</button>
  </form>
</div>
</body>
</html>
"#,
        client = html_escape(&client_label),
        redirect = html_escape(&request.redirect_uri),
        hidden = hidden,
    );

    Html(body)
}

/// Escape a string for safe interpolation into HTML text and attributes.
fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
