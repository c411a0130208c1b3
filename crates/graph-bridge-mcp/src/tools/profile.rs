//! Profile tool: get_profile.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{ProfileInput, ResponseFormat};

/// Signed-in user profile tool.
pub struct GetProfileTool;

#[async_trait::async_trait]
impl McpTool for GetProfileTool {
    fn name(&self) -> &'static str {
        "get_profile"
    }

    fn description(&self) -> &'static str {
        "Get the signed-in user's Microsoft 365 profile: display name, email \
         address, job title, and office location."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "responseFormat": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "description": "Output format. Defaults to the client's preference."
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: ProfileInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        let user = ctx.graph.me(token).await.map_err(ToolError::from)?;

        match params.response_format.unwrap_or_else(|| ctx.default_format()) {
            ResponseFormat::Markdown => Ok(formatters::format_profile_markdown(&user)),
            ResponseFormat::Json => {
                Ok(serde_json::to_string_pretty(&formatters::compact_user(&user))?)
            }
        }
    }
}
