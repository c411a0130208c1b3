//! OAuth record persistence over the token store.
//!
//! Server instances hold no OAuth state of their own: every record lives in
//! the [`KvStore`], with store TTLs doing the expiry the original in-process
//! sweeps would have done.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::types::{
    AccessTokenRecord, AuthCodeRecord, ClientRecord, GrantProps, RefreshGrantRecord,
    TokenEndpointAuthMethod, TokenPair,
};
use crate::config::Config;
use crate::error::StoreResult;
use crate::store::{KvStore, get_json, keys, put_json};

/// OAuth state store backed by the shared key-value store.
#[derive(Clone)]
pub struct OAuthStore {
    kv: Arc<dyn KvStore>,
    auth_code_ttl: Duration,
    refresh_grant_ttl: Duration,
}

impl OAuthStore {
    /// Create a store using the configured record lifetimes.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>, config: &Config) -> Self {
        Self {
            kv,
            auth_code_ttl: config.auth_code_ttl,
            refresh_grant_ttl: config.refresh_grant_ttl,
        }
    }

    /// Generate a random token using two UUIDs (256 bits).
    fn generate_token() -> String {
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    }

    /// Register a new OAuth client (Dynamic Client Registration).
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be persisted.
    pub async fn register_client(
        &self,
        client_name: Option<String>,
        redirect_uris: Vec<String>,
        token_endpoint_auth_method: TokenEndpointAuthMethod,
        grant_types: Vec<String>,
        response_types: Vec<String>,
    ) -> StoreResult<ClientRecord> {
        let client_id = uuid::Uuid::new_v4().simple().to_string();

        let record = ClientRecord {
            client_id: client_id.clone(),
            client_name,
            redirect_uris,
            token_endpoint_auth_method,
            grant_types,
            response_types,
            registered_at: Utc::now(),
        };

        put_json(self.kv.as_ref(), &keys::client(&client_id), &record, None).await?;
        Ok(record)
    }

    /// Look up a client by id.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn get_client(&self, client_id: &str) -> StoreResult<Option<ClientRecord>> {
        get_json(self.kv.as_ref(), &keys::client(client_id)).await
    }

    /// Add a redirect URI to an existing client, the one mutation client
    /// records allow. No-op if the URI is already registered.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn add_redirect_uri(
        &self,
        client_id: &str,
        redirect_uri: &str,
    ) -> StoreResult<Option<ClientRecord>> {
        let Some(mut record) = self.get_client(client_id).await? else {
            return Ok(None);
        };

        if !record.allows_redirect(redirect_uri) {
            record.redirect_uris.push(redirect_uri.to_string());
            put_json(self.kv.as_ref(), &keys::client(client_id), &record, None).await?;
        }

        Ok(Some(record))
    }

    /// Look up the alias target for a well-known static client id.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn get_static_alias(&self, well_known_id: &str) -> StoreResult<Option<String>> {
        self.kv.get(&keys::static_client_actual(well_known_id)).await
    }

    /// Point a well-known static client id at a registered client.
    /// Last write wins when callers race.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn put_static_alias(&self, well_known_id: &str, client_id: &str) -> StoreResult<()> {
        self.kv
            .put(&keys::static_client_actual(well_known_id), client_id.to_string(), None)
            .await
    }

    /// Create an authorization code for an approved request.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be persisted.
    pub async fn create_auth_code(&self, record: &AuthCodeRecord) -> StoreResult<String> {
        let code = Self::generate_token();
        put_json(self.kv.as_ref(), &keys::auth_code(&code), record, Some(self.auth_code_ttl))
            .await?;
        Ok(code)
    }

    /// Consume an authorization code (one-time use).
    ///
    /// Returns the code details if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn consume_auth_code(&self, code: &str) -> StoreResult<Option<AuthCodeRecord>> {
        let key = keys::auth_code(code);
        let Some(record) = get_json::<AuthCodeRecord>(self.kv.as_ref(), &key).await? else {
            return Ok(None);
        };
        self.kv.delete(&key).await?;
        Ok(Some(record))
    }

    /// Create an access + refresh token pair carrying the given props.
    ///
    /// # Errors
    ///
    /// Returns error if the records cannot be persisted.
    pub async fn create_token_pair(
        &self,
        client_id: &str,
        user_id: &str,
        scope: &str,
        access_props: GrantProps,
        refresh_props: GrantProps,
        expires_in: u64,
    ) -> StoreResult<TokenPair> {
        let access = Self::generate_token();
        let refresh = Self::generate_token();
        let now = Utc::now();

        let access_record = AccessTokenRecord {
            client_id: client_id.to_owned(),
            user_id: user_id.to_owned(),
            scope: scope.to_owned(),
            props: access_props,
            expires_in,
            created_at: now,
        };
        put_json(
            self.kv.as_ref(),
            &keys::access_token(&access),
            &access_record,
            Some(Duration::from_secs(expires_in)),
        )
        .await?;

        let refresh_record = RefreshGrantRecord {
            client_id: client_id.to_owned(),
            user_id: user_id.to_owned(),
            scope: scope.to_owned(),
            props: refresh_props,
            created_at: now,
        };
        put_json(
            self.kv.as_ref(),
            &keys::refresh_grant(&refresh),
            &refresh_record,
            Some(self.refresh_grant_ttl),
        )
        .await?;

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
            expires_in,
            scope: scope.to_owned(),
        })
    }

    /// Validate an access token, returning its record if live.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn validate_access_token(
        &self,
        token: &str,
    ) -> StoreResult<Option<AccessTokenRecord>> {
        let Some(record) =
            get_json::<AccessTokenRecord>(self.kv.as_ref(), &keys::access_token(token)).await?
        else {
            return Ok(None);
        };

        if record.is_expired() {
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Look up a refresh grant without consuming it.
    ///
    /// The grant is only deleted after a successful upstream exchange, so a
    /// transient IdP failure never strands the client.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn get_refresh_grant(
        &self,
        token: &str,
    ) -> StoreResult<Option<RefreshGrantRecord>> {
        get_json(self.kv.as_ref(), &keys::refresh_grant(token)).await
    }

    /// Delete a refresh grant, completing a rotation.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn delete_refresh_grant(&self, token: &str) -> StoreResult<()> {
        self.kv.delete(&keys::refresh_grant(token)).await
    }
}

impl std::fmt::Debug for OAuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    fn test_store() -> OAuthStore {
        let config = Config::for_testing("http://localhost:9999");
        OAuthStore::new(Arc::new(MemoryKvStore::new()), &config)
    }

    fn code_record(client_id: &str) -> AuthCodeRecord {
        AuthCodeRecord {
            client_id: client_id.to_string(),
            redirect_uri: "https://claude.ai/cb".to_string(),
            code_challenge: "challenge".to_string(),
            code_challenge_method: "S256".to_string(),
            scope: "mcp".to_string(),
            user_id: "user-1".to_string(),
            props: GrantProps {
                upstream_code: Some("upstream-code".to_string()),
                ..GrantProps::default()
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_client_registration() {
        let store = test_store();
        let client = store
            .register_client(
                Some("Test App".into()),
                vec!["http://localhost/callback".into()],
                TokenEndpointAuthMethod::None,
                vec!["authorization_code".into()],
                vec!["code".into()],
            )
            .await
            .unwrap();

        assert!(!client.client_id.is_empty());

        let info = store.get_client(&client.client_id).await.unwrap();
        assert!(info.is_some());
        assert_eq!(info.unwrap().client_name.as_deref(), Some("Test App"));
    }

    #[tokio::test]
    async fn test_add_redirect_uri() {
        let store = test_store();
        let client = store
            .register_client(
                None,
                Vec::new(),
                TokenEndpointAuthMethod::None,
                vec!["authorization_code".into()],
                vec!["code".into()],
            )
            .await
            .unwrap();

        let updated = store
            .add_redirect_uri(&client.client_id, "https://claude.ai/cb")
            .await
            .unwrap()
            .unwrap();
        assert!(updated.allows_redirect("https://claude.ai/cb"));

        // Adding again is a no-op
        let again = store
            .add_redirect_uri(&client.client_id, "https://claude.ai/cb")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.redirect_uris.len(), 1);

        // Unknown client
        assert!(store.add_redirect_uri("nope", "https://x/cb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_alias() {
        let store = test_store();
        assert!(store.get_static_alias("claude").await.unwrap().is_none());

        store.put_static_alias("claude", "actual-id").await.unwrap();
        assert_eq!(store.get_static_alias("claude").await.unwrap().as_deref(), Some("actual-id"));

        // Last write wins
        store.put_static_alias("claude", "newer-id").await.unwrap();
        assert_eq!(store.get_static_alias("claude").await.unwrap().as_deref(), Some("newer-id"));
    }

    #[tokio::test]
    async fn test_auth_code_single_use() {
        let store = test_store();
        let code = store.create_auth_code(&code_record("client1")).await.unwrap();

        // First consume succeeds and carries the props through
        let info = store.consume_auth_code(&code).await.unwrap();
        assert!(info.is_some());
        let info = info.unwrap();
        assert_eq!(info.client_id, "client1");
        assert_eq!(info.props.upstream_code.as_deref(), Some("upstream-code"));

        // Second consume fails
        assert!(store.consume_auth_code(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_pair_lifecycle() {
        let store = test_store();
        let access_props = GrantProps {
            upstream_access_token: Some("graph-token".to_string()),
            ..GrantProps::default()
        };
        let refresh_props = GrantProps {
            upstream_refresh_token: Some("graph-refresh".to_string()),
            ..GrantProps::default()
        };

        let pair = store
            .create_token_pair("client1", "user-1", "mcp", access_props, refresh_props, 3600)
            .await
            .unwrap();

        let record = store.validate_access_token(&pair.access_token).await.unwrap().unwrap();
        assert_eq!(record.client_id, "client1");
        assert_eq!(record.props.upstream_access_token.as_deref(), Some("graph-token"));
        assert!(record.props.upstream_refresh_token.is_none());

        let grant = store.get_refresh_grant(&pair.refresh_token).await.unwrap().unwrap();
        assert_eq!(grant.props.upstream_refresh_token.as_deref(), Some("graph-refresh"));

        assert!(store.validate_access_token("invalid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_grant_survives_until_deleted() {
        let store = test_store();
        let pair = store
            .create_token_pair(
                "client1",
                "user-1",
                "mcp",
                GrantProps::default(),
                GrantProps::default(),
                3600,
            )
            .await
            .unwrap();

        // Reading does not consume
        assert!(store.get_refresh_grant(&pair.refresh_token).await.unwrap().is_some());
        assert!(store.get_refresh_grant(&pair.refresh_token).await.unwrap().is_some());

        store.delete_refresh_grant(&pair.refresh_token).await.unwrap();
        assert!(store.get_refresh_grant(&pair.refresh_token).await.unwrap().is_none());
    }
}
