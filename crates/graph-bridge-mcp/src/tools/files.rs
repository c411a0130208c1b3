//! OneDrive tools: list_files, search_files.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{ListFilesInput, ResponseFormat};

/// Folder listing tool.
pub struct ListFilesTool;

#[async_trait::async_trait]
impl McpTool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "List files and folders in the signed-in user's OneDrive. Defaults to \
         the drive root; pass a folder path like 'Documents/Reports' to list \
         inside it."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "folder": {
                    "type": "string",
                    "description": "Folder path relative to the drive root, e.g. 'Documents/Reports'"
                },
                "limit": {
                    "type": "integer",
                    "default": 20,
                    "description": "Maximum items to return"
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
        let params: ListFilesInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        let items = ctx
            .graph
            .list_drive_children(token, params.folder.as_deref(), params.limit)
            .await
            .map_err(ToolError::from)?;

        format_items(&items, params.response_format.unwrap_or_else(|| ctx.default_format()))
    }
}

/// Drive search tool.
pub struct SearchFilesTool;

#[async_trait::async_trait]
impl McpTool for SearchFilesTool {
    fn name(&self) -> &'static str {
        "search_files"
    }

    fn description(&self) -> &'static str {
        "Search the signed-in user's entire OneDrive by file name and content."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "search": {
                    "type": "string",
                    "description": "Search query, e.g. 'quarterly report'"
                },
                "limit": {
                    "type": "integer",
                    "default": 20,
                    "description": "Maximum items to return"
                },
                "responseFormat": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "description": "Output format. Defaults to the client's preference."
                }
            },
            "required": ["search"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: ListFilesInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        let Some(query) = params.search.as_deref().filter(|q| !q.trim().is_empty()) else {
            return Err(ToolError::validation("search", "must not be empty"));
        };

        let items = ctx
            .graph
            .search_drive(token, query, params.limit)
            .await
            .map_err(ToolError::from)?;

        format_items(&items, params.response_format.unwrap_or_else(|| ctx.default_format()))
    }
}

fn format_items(
    items: &[crate::models::DriveItem],
    format: ResponseFormat,
) -> ToolResult<String> {
    match format {
        ResponseFormat::Markdown => Ok(formatters::format_drive_items_markdown(items)),
        ResponseFormat::Json => {
            let compact = items.iter().map(formatters::compact_drive_item).collect::<Vec<_>>();
            Ok(serde_json::to_string_pretty(&compact)?)
        }
    }
}
