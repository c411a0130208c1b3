//! Microsoft Graph API client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - Response caching through the token store (5-minute TTL)
//!
//! Every call takes the bridged bearer token for the requesting user; the
//! client itself holds no credentials.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, fields};
use crate::error::{GraphError, GraphResult};
use crate::models::{CalendarEvent, Contact, DriveItem, GraphList, Message, User};
use crate::store::{KvStore, keys};

/// Microsoft Graph API client.
#[derive(Clone)]
pub struct GraphClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Shared store for response caching.
    store: Arc<dyn KvStore>,

    /// Graph base URL.
    base_url: String,

    /// Cache TTL for read responses. Zero disables caching.
    cache_ttl: Duration,
}

impl GraphClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config, store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            store,
            base_url: config.graph_url.clone(),
            cache_ttl: config.cache_ttl,
        })
    }

    /// Get the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn me(&self, token: &str) -> GraphResult<User> {
        let url = format!("{}/me", self.base_url);
        let params = vec![("$select".to_string(), fields::USER.join(","))];

        self.get(token, &url, &params).await
    }

    /// List mail messages, newest first.
    ///
    /// `$search` cannot be combined with `$filter` or `$orderby` on Graph, so
    /// when a search query is given the unread filter and ordering are left to
    /// the search ranking.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn list_messages(
        &self,
        token: &str,
        folder: Option<&str>,
        search: Option<&str>,
        unread_only: bool,
        limit: i32,
    ) -> GraphResult<Vec<Message>> {
        let url = match folder {
            Some(folder) => {
                format!("{}/me/mailFolders/{}/messages", self.base_url, percent_encode(folder))
            }
            None => format!("{}/me/messages", self.base_url),
        };

        let mut params = vec![
            ("$select".to_string(), fields::MESSAGE.join(",")),
            ("$top".to_string(), limit.to_string()),
        ];

        if let Some(query) = search {
            params.push(("$search".to_string(), format!("\"{query}\"")));
        } else {
            params.push(("$orderby".to_string(), "receivedDateTime desc".to_string()));
            if unread_only {
                params.push(("$filter".to_string(), "isRead eq false".to_string()));
            }
        }

        let result: GraphList<Message> = self.get(token, &url, &params).await?;
        Ok(result.value)
    }

    /// Send a mail message from the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn send_mail(
        &self,
        token: &str,
        to: &[String],
        cc: Option<&[String]>,
        subject: &str,
        body: &str,
        html: bool,
    ) -> GraphResult<()> {
        let url = format!("{}/me/sendMail", self.base_url);

        let recipients = |addresses: &[String]| -> Vec<serde_json::Value> {
            addresses
                .iter()
                .map(|address| serde_json::json!({"emailAddress": {"address": address}}))
                .collect()
        };

        let body = serde_json::json!({
            "message": {
                "subject": subject,
                "body": {
                    "contentType": if html { "HTML" } else { "Text" },
                    "content": body
                },
                "toRecipients": recipients(to),
                "ccRecipients": cc.map(recipients).unwrap_or_default()
            },
            "saveToSentItems": true
        });

        self.post_no_content(token, &url, &body).await
    }

    /// List calendar events in a time window, earliest first.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn calendar_view(
        &self,
        token: &str,
        start: &str,
        end: &str,
        limit: i32,
    ) -> GraphResult<Vec<CalendarEvent>> {
        let url = format!("{}/me/calendarView", self.base_url);

        let params = vec![
            ("startDateTime".to_string(), start.to_string()),
            ("endDateTime".to_string(), end.to_string()),
            ("$select".to_string(), fields::EVENT.join(",")),
            ("$top".to_string(), limit.to_string()),
            ("$orderby".to_string(), "start/dateTime".to_string()),
        ];

        let result: GraphList<CalendarEvent> = self.get(token, &url, &params).await?;
        Ok(result.value)
    }

    /// Create a calendar event on the default calendar.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        token: &str,
        subject: &str,
        start: &str,
        end: &str,
        time_zone: &str,
        body: Option<&str>,
        location: Option<&str>,
        attendees: Option<&[String]>,
    ) -> GraphResult<CalendarEvent> {
        let url = format!("{}/me/events", self.base_url);

        let mut event = serde_json::json!({
            "subject": subject,
            "start": {"dateTime": start, "timeZone": time_zone},
            "end": {"dateTime": end, "timeZone": time_zone}
        });

        if let Some(text) = body {
            event["body"] = serde_json::json!({"contentType": "Text", "content": text});
        }
        if let Some(name) = location {
            event["location"] = serde_json::json!({"displayName": name});
        }
        if let Some(addresses) = attendees {
            event["attendees"] = serde_json::json!(
                addresses
                    .iter()
                    .map(|address| serde_json::json!({
                        "emailAddress": {"address": address},
                        "type": "required"
                    }))
                    .collect::<Vec<_>>()
            );
        }

        self.post(token, &url, &event).await
    }

    /// List children of a OneDrive folder (drive root when no path given).
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn list_drive_children(
        &self,
        token: &str,
        folder_path: Option<&str>,
        limit: i32,
    ) -> GraphResult<Vec<DriveItem>> {
        let url = match folder_path {
            Some(path) => {
                let encoded: Vec<String> =
                    path.split('/').filter(|s| !s.is_empty()).map(percent_encode).collect();
                format!("{}/me/drive/root:/{}:/children", self.base_url, encoded.join("/"))
            }
            None => format!("{}/me/drive/root/children", self.base_url),
        };

        let params = vec![
            ("$select".to_string(), fields::DRIVE_ITEM.join(",")),
            ("$top".to_string(), limit.to_string()),
        ];

        let result: GraphList<DriveItem> = self.get(token, &url, &params).await?;
        Ok(result.value)
    }

    /// Search the whole drive by file name and content.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn search_drive(
        &self,
        token: &str,
        query: &str,
        limit: i32,
    ) -> GraphResult<Vec<DriveItem>> {
        // Single quotes in the q parameter are doubled per OData literal rules
        let escaped = query.replace('\'', "''");
        let url =
            format!("{}/me/drive/root/search(q='{}')", self.base_url, percent_encode(&escaped));

        let params = vec![
            ("$select".to_string(), fields::DRIVE_ITEM.join(",")),
            ("$top".to_string(), limit.to_string()),
        ];

        let result: GraphList<DriveItem> = self.get(token, &url, &params).await?;
        Ok(result.value)
    }

    /// List personal contacts, optionally filtered by display name prefix.
    ///
    /// # Errors
    ///
    /// Returns error on Graph failure.
    pub async fn list_contacts(
        &self,
        token: &str,
        search: Option<&str>,
        limit: i32,
    ) -> GraphResult<Vec<Contact>> {
        let url = format!("{}/me/contacts", self.base_url);

        let mut params = vec![
            ("$select".to_string(), fields::CONTACT.join(",")),
            ("$top".to_string(), limit.to_string()),
        ];

        if let Some(prefix) = search {
            let escaped = prefix.replace('\'', "''");
            params.push(("$filter".to_string(), format!("startswith(displayName,'{escaped}')")));
        }

        let result: GraphList<Contact> = self.get(token, &url, &params).await?;
        Ok(result.value)
    }

    /// Make a GET request with caching.
    async fn get<T>(&self, token: &str, url: &str, params: &[(String, String)]) -> GraphResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let cache_key = keys::cache(&self.cache_digest(token, url, params));

        // Check cache; a store failure here degrades to a miss
        if !self.cache_ttl.is_zero() {
            match self.store.get(&cache_key).await {
                Ok(Some(cached)) => return serde_json::from_str(&cached).map_err(GraphError::from),
                Ok(None) => {}
                Err(error) => tracing::debug!(%error, "cache read failed"),
            }
        }

        let response = self.client.get(url).query(params).bearer_auth(token).send().await?;

        let response = handle_response(response).await?;
        let text = response.text().await.map_err(GraphError::Http)?;

        if !self.cache_ttl.is_zero() {
            if let Err(error) =
                self.store.put(&cache_key, text.clone(), Some(self.cache_ttl)).await
            {
                tracing::debug!(%error, "cache write failed");
            }
        }

        serde_json::from_str(&text).map_err(GraphError::from)
    }

    /// Make a POST request expecting a JSON body back. Never cached.
    async fn post<T>(&self, token: &str, url: &str, body: &serde_json::Value) -> GraphResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.post(url).bearer_auth(token).json(body).send().await?;

        let response = handle_response(response).await?;
        response.json().await.map_err(GraphError::Http)
    }

    /// Make a POST request expecting an empty 2xx response.
    async fn post_no_content(
        &self,
        token: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> GraphResult<()> {
        let response = self.client.post(url).bearer_auth(token).json(body).send().await?;

        handle_response(response).await?;
        Ok(())
    }

    /// Generate cache digest. The token is part of the digest so different
    /// users never share cached responses.
    fn cache_digest(&self, token: &str, url: &str, params: &[(String, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(token.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Handle Graph response status codes.
async fn handle_response(response: reqwest::Response) -> GraphResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(GraphError::rate_limited(retry_after))
        }
        401 => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::unauthorized(graph_error_message(&text)))
        }
        403 => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::forbidden(graph_error_message(&text)))
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::not_found(graph_error_message(&text)))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::bad_request(graph_error_message(&text)))
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::server(status.as_u16(), graph_error_message(&text)))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(GraphError::UnexpectedStatus { status: status.as_u16(), message: text })
        }
    }
}

/// Pull the human-readable message out of a Graph error body, falling back to
/// the raw text. Graph wraps errors as `{"error": {"code": ..., "message": ...}}`.
fn graph_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let code = parsed.error.code.unwrap_or_default();
            let message = parsed.error.message.unwrap_or_default();
            if code.is_empty() { message } else { format!("{code}: {message}") }
        }
        Err(_) => body.chars().take(200).collect(),
    }
}

/// Percent-encode a string for use in a URL path segment.
fn percent_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    encoded
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient").field("base_url", &self.base_url).finish()
    }
}
