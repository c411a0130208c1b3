//! MCP tool implementations over Microsoft Graph.
//!
//! Each tool module provides implementations that:
//! 1. Parse and validate input parameters
//! 2. Call Microsoft Graph with the caller's bridged token
//! 3. Format results as Markdown or JSON

mod calendar;
mod contacts;
mod files;
mod mail;
mod profile;

pub use calendar::*;
pub use contacts::*;
pub use files::*;
pub use mail::*;
pub use profile::*;

use std::sync::Arc;

use crate::error::{ToolError, ToolResult};
use crate::graph::GraphClient;
use crate::models::ResponseFormat;
use crate::server::oauth::types::GrantProps;

/// Tool execution context, bound to one authenticated request.
pub struct ToolContext {
    /// Graph API client.
    pub graph: Arc<GraphClient>,

    /// Grant props carried by the caller's access token.
    pub props: GrantProps,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(graph: Arc<GraphClient>, props: GrantProps) -> Self {
        Self { graph, props }
    }

    /// The bridged Microsoft Graph access token.
    ///
    /// # Errors
    ///
    /// Returns error when the grant carries no Graph token, which happens for
    /// grants minted without an upstream exchange.
    pub fn access_token(&self) -> ToolResult<&str> {
        self.props.upstream_access_token.as_deref().ok_or_else(|| {
            ToolError::unavailable("no Microsoft Graph token is linked to this session")
        })
    }

    /// Output format to use when the tool input does not name one.
    #[must_use]
    pub fn default_format(&self) -> ResponseFormat {
        self.props.client_kind.default_format()
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "list_mail").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        // Profile (1)
        Box::new(profile::GetProfileTool),
        // Mail (2)
        Box::new(mail::ListMailTool),
        Box::new(mail::SendMailTool),
        // Calendar (2)
        Box::new(calendar::ListEventsTool),
        Box::new(calendar::CreateEventTool),
        // Files (2)
        Box::new(files::ListFilesTool),
        Box::new(files::SearchFilesTool),
        // Contacts (1)
        Box::new(contacts::ListContactsTool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_registered() {
        let tools = register_all_tools();
        assert_eq!(tools.len(), 8);

        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert!(names.contains(&"get_profile"));
        assert!(names.contains(&"list_mail"));
        assert!(names.contains(&"send_mail"));
        assert!(names.contains(&"list_events"));
        assert!(names.contains(&"create_event"));
        assert!(names.contains(&"list_files"));
        assert!(names.contains(&"search_files"));
        assert!(names.contains(&"list_contacts"));
    }

    #[test]
    fn test_tool_names_unique() {
        let tools = register_all_tools();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in register_all_tools() {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "schema for {}", tool.name());
        }
    }

    #[test]
    fn test_context_without_graph_token() {
        let config = crate::config::Config::for_testing("http://127.0.0.1:9");
        let store = Arc::new(crate::store::MemoryKvStore::new());
        let graph = Arc::new(GraphClient::new(&config, store).unwrap());

        let ctx = ToolContext::new(graph, GrantProps::default());
        assert!(ctx.access_token().is_err());
    }
}
