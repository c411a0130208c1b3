//! Static client alias resolution.
//!
//! Some MCP clients present a fixed, well-known client id instead of running
//! dynamic registration. The alias maps that id to a real registered client
//! record, created lazily the first time the well-known id shows up and
//! persisted so every later request resolves to the same client.

use super::store::OAuthStore;
use super::types::TokenEndpointAuthMethod;
use crate::error::{BridgeError, BridgeResult};

/// Resolve a requested client id to the id validation should use.
///
/// Ids other than the well-known one pass through untouched; that covers both
/// dynamically registered clients and the alias target itself. The well-known
/// id resolves to its alias target, bootstrapping the target on first use.
///
/// # Errors
///
/// Returns error if bootstrap registration or the alias lookup fails. Failures
/// surface immediately; there is no retry.
pub async fn resolve_client_id(
    store: &OAuthStore,
    well_known_id: &str,
    requested: &str,
) -> BridgeResult<String> {
    if requested != well_known_id {
        return Ok(requested.to_owned());
    }
    ensure_static_client(store, well_known_id).await
}

/// Make sure the alias target for a well-known id exists, returning its
/// client id.
///
/// Concurrent first sightings may both register; the alias write is
/// last-write-wins and every registered record stays valid, so whichever
/// target a caller got back keeps working.
///
/// # Errors
///
/// Returns error if registration or persistence fails.
pub async fn ensure_static_client(
    store: &OAuthStore,
    well_known_id: &str,
) -> BridgeResult<String> {
    if let Some(actual) = store.get_static_alias(well_known_id).await? {
        return Ok(actual);
    }

    let record = store
        .register_client(
            Some(format!("Static client ({well_known_id})")),
            Vec::new(),
            TokenEndpointAuthMethod::None,
            vec!["authorization_code".to_string(), "refresh_token".to_string()],
            vec!["code".to_string()],
        )
        .await
        .map_err(|e| BridgeError::registration(e.to_string()))?;

    store
        .put_static_alias(well_known_id, &record.client_id)
        .await
        .map_err(|e| BridgeError::registration(e.to_string()))?;

    tracing::info!(
        well_known_id = %well_known_id,
        client_id = %record.client_id,
        "bootstrapped static client alias"
    );

    Ok(record.client_id)
}
