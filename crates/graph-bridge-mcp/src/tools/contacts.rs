//! Contacts tool: list_contacts.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{ListContactsInput, ResponseFormat};

/// Personal contacts tool.
pub struct ListContactsTool;

#[async_trait::async_trait]
impl McpTool for ListContactsTool {
    fn name(&self) -> &'static str {
        "list_contacts"
    }

    fn description(&self) -> &'static str {
        "List the signed-in user's personal contacts, optionally filtered by \
         a display-name prefix."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "search": {
                    "type": "string",
                    "description": "Display-name prefix to filter by, e.g. 'Ana'"
                },
                "limit": {
                    "type": "integer",
                    "default": 20,
                    "description": "Maximum contacts to return"
                },
                "responseFormat": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "description": "Output format. Defaults to the client's preference."
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: ListContactsInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        let contacts = ctx
            .graph
            .list_contacts(token, params.search.as_deref(), params.limit)
            .await
            .map_err(ToolError::from)?;

        match params.response_format.unwrap_or_else(|| ctx.default_format()) {
            ResponseFormat::Markdown => Ok(formatters::format_contacts_markdown(&contacts)),
            ResponseFormat::Json => {
                let compact =
                    contacts.iter().map(formatters::compact_contact).collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&compact)?)
            }
        }
    }
}
