//! OAuth 2.1 authorization server bridging MCP clients to Microsoft Entra ID.
//!
//! Downstream, this is a self-contained authorization server for MCP clients
//! (Claude.ai Custom Connectors, MCP Inspector): dynamic registration, PKCE
//! authorization code grant, refresh tokens. Upstream, it acts as a
//! confidential OAuth client of the Microsoft identity platform, carrying the
//! Graph tokens it obtains inside opaque grant props.
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code Grant

pub mod alias;
pub mod bridge;
pub mod grants;
pub mod handlers;
pub mod pkce;
pub mod seal;
pub mod store;
pub mod types;

pub use store::OAuthStore;
