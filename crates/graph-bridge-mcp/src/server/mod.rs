//! MCP server over HTTP.
//!
//! One `/mcp` endpoint serves JSON-RPC POSTs, SSE bootstrap streams, and
//! WebSocket sessions; the surrounding routes implement the OAuth
//! authorization server that guards it. Server instances are stateless:
//! everything that must survive a request lives in the key-value store, so
//! any instance can answer any leg of a flow.

pub mod oauth;
pub mod transport;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::graph::GraphClient;
use crate::server::oauth::OAuthStore;
use crate::store::KvStore;
use crate::tools::{self, McpTool};
use crate::upstream::TokenExchanger;

/// MCP server bridging Microsoft Graph to MCP clients.
pub struct McpServer {
    state: Arc<transport::HttpState>,
}

impl McpServer {
    /// Wire up the server from configuration and a key-value store.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be constructed.
    pub fn new(config: Config, kv: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let oauth = OAuthStore::new(Arc::clone(&kv), &config);
        let exchanger = TokenExchanger::new(&config)?;
        let graph = Arc::new(GraphClient::new(&config, kv)?);
        let tools = tools::register_all_tools();

        let state = Arc::new(transport::HttpState { config, oauth, exchanger, graph, tools });
        Ok(Self { state })
    }

    /// Run the HTTP server until shutdown.
    ///
    /// # Errors
    ///
    /// Returns error on bind or serve failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        tracing::info!(port = port, tools = self.state.tools.len(), "starting MCP server");

        let router = transport::create_router(self.state);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    /// List all available tools.
    #[must_use]
    pub fn list_tools(&self) -> Vec<(&str, &str)> {
        self.state.tools.iter().map(|t| (t.name(), t.description())).collect()
    }

    /// Get tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&dyn McpTool> {
        self.state.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer").field("tools", &self.state.tools.len()).finish()
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("Failed to install CTRL+C handler");
    tracing::info!("Received shutdown signal");
}
