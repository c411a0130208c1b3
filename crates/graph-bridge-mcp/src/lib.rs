//! Microsoft Graph MCP Server
//!
//! A Model Context Protocol (MCP) server exposing Microsoft 365 resources
//! (profile, mail, calendar, OneDrive, contacts) to LLM clients, guarded by
//! a built-in OAuth 2.1 authorization server that bridges to Microsoft
//! Entra ID.
//!
//! # Features
//!
//! - **8 MCP tools** over Microsoft Graph: profile, mail list/send, calendar
//!   list/create, file list/search, contacts
//! - **OAuth 2.1 + PKCE** toward clients, confidential Entra client upstream
//! - **Three protocols** on one `/mcp` endpoint: JSON-RPC POST, SSE, WebSocket
//! - **Stateless**: every OAuth record lives in a pluggable key-value store
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use graph_bridge_mcp::{config::Config, server::McpServer, store::MemoryKvStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = McpServer::new(config, Arc::new(MemoryKvStore::new()))?;
//!     server.run_http(8080).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod formatters;
pub mod graph;
pub mod models;
pub mod server;
pub mod store;
pub mod tools;
pub mod upstream;

pub use config::Config;
pub use error::{BridgeError, GraphError, ToolError};
pub use graph::GraphClient;
