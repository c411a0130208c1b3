//! Enumeration types for tool parameters and client classification.

use serde::{Deserialize, Serialize};

/// Output format for tool responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable Markdown format.
    #[default]
    Markdown,
    /// Machine-readable JSON format.
    Json,
}

impl ResponseFormat {
    /// Check if this is markdown format.
    #[must_use]
    pub const fn is_markdown(self) -> bool {
        matches!(self, Self::Markdown)
    }

    /// Check if this is JSON format.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Rough classification of the connecting MCP client.
///
/// Detected once from the redirect URI during authorization and carried in
/// grant props, so every later request knows which client family it serves
/// without re-deriving anything. Closed set on purpose: anything we do not
/// recognize is [`ClientKind::Unknown`], never a parse error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// Claude desktop or web client.
    Claude,
    /// MCP Inspector or another local development tool.
    Inspector,
    /// Anything else.
    #[default]
    Unknown,
}

impl ClientKind {
    /// Classify a client by its redirect URI.
    #[must_use]
    pub fn detect(redirect_uri: &str) -> Self {
        if redirect_uri.contains("claude.ai") || redirect_uri.contains("claude.com") {
            Self::Claude
        } else if redirect_uri.contains("localhost") || redirect_uri.contains("127.0.0.1") {
            Self::Inspector
        } else {
            Self::Unknown
        }
    }

    /// Human-readable name for the approval page.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Inspector => "MCP Inspector",
            Self::Unknown => "MCP client",
        }
    }

    /// Output format this client family prefers when a tool call does not
    /// ask for one explicitly.
    #[must_use]
    pub const fn default_format(self) -> ResponseFormat {
        match self {
            Self::Claude | Self::Unknown => ResponseFormat::Markdown,
            Self::Inspector => ResponseFormat::Json,
        }
    }
}
