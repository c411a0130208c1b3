//! Token store abstraction.
//!
//! Everything the OAuth bridge persists (client records, authorization codes,
//! grants, access tokens, cached Graph responses) goes through [`KvStore`], so
//! server instances stay stateless and a deployment can swap the in-memory
//! backend for a shared one without touching the endpoint handlers.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{StoreError, StoreResult};

/// Key builders for the store namespaces.
pub mod keys {
    /// Client registration record.
    #[must_use]
    pub fn client(client_id: &str) -> String {
        format!("client:{client_id}")
    }

    /// Alias target for a well-known static client id.
    #[must_use]
    pub fn static_client_actual(well_known_id: &str) -> String {
        format!("static_client_actual:{well_known_id}")
    }

    /// Downstream authorization code.
    #[must_use]
    pub fn auth_code(code: &str) -> String {
        format!("code:{code}")
    }

    /// Downstream access token.
    #[must_use]
    pub fn access_token(token: &str) -> String {
        format!("token:{token}")
    }

    /// Downstream refresh grant.
    #[must_use]
    pub fn refresh_grant(token: &str) -> String {
        format!("grant:{token}")
    }

    /// Cached Graph response.
    #[must_use]
    pub fn cache(digest: &str) -> String {
        format!("cache:{digest}")
    }
}

/// Get/put/delete over string keys and values, with optional per-entry TTL.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value, replacing any existing entry and its TTL.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Fetch and JSON-decode a stored value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(StoreError::Serialize)?)),
        None => Ok(None),
    }
}

/// JSON-encode and store a value.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(StoreError::Serialize)?;
    store.put(key, raw, ttl).await
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
}

/// Per-entry expiration policy: each entry carries its own TTL, entries
/// without one live until evicted.
struct EntryExpiry;

impl moka::Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// In-memory [`KvStore`] backed by `moka`.
///
/// Suitable for single-instance deployments and tests. Expiry is enforced on
/// read, so a TTL that has lapsed is invisible even before eviction runs.
pub struct MemoryKvStore {
    cache: moka::future::Cache<String, Entry>,
}

impl MemoryKvStore {
    /// Create an unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self { cache: moka::future::Cache::builder().expire_after(EntryExpiry).build() }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        self.cache.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryKvStore::new();

        store.put("client:abc", "{}".to_string(), None).await.unwrap();
        assert_eq!(store.get("client:abc").await.unwrap(), Some("{}".to_string()));

        store.delete("client:abc").await.unwrap();
        assert_eq!(store.get("client:abc").await.unwrap(), None);

        // Deleting again is a no-op
        store.delete("client:abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryKvStore::new();

        store
            .put("code:xyz", "value".to_string(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(store.get("code:xyz").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("code:xyz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let store = MemoryKvStore::new();

        store
            .put("grant:t", "first".to_string(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        store.put("grant:t", "second".to_string(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        // The overwrite dropped the short TTL
        assert_eq!(store.get("grant:t").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_json_helpers() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Record {
            id: String,
            count: u32,
        }

        let store = MemoryKvStore::new();
        let record = Record { id: "r1".to_string(), count: 3 };

        put_json(&store, "client:r1", &record, None).await.unwrap();
        let loaded: Option<Record> = get_json(&store, "client:r1").await.unwrap();
        assert_eq!(loaded, Some(record));

        let missing: Option<Record> = get_json(&store, "client:nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_key_namespaces() {
        assert_eq!(keys::client("abc"), "client:abc");
        assert_eq!(keys::static_client_actual("claude"), "static_client_actual:claude");
        assert_eq!(keys::auth_code("c1"), "code:c1");
        assert_eq!(keys::access_token("t1"), "token:t1");
        assert_eq!(keys::refresh_grant("r1"), "grant:r1");
        assert_eq!(keys::cache("d1"), "cache:d1");
    }
}
