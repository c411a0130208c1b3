//! Mail tools: list_mail, send_mail.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{ListMailInput, ResponseFormat, SendMailInput};

/// Maximum messages one call may request.
const MAX_MAIL_LIMIT: i32 = 50;

/// Mailbox listing tool.
pub struct ListMailTool;

#[async_trait::async_trait]
impl McpTool for ListMailTool {
    fn name(&self) -> &'static str {
        "list_mail"
    }

    fn description(&self) -> &'static str {
        "List recent mail messages, newest first. Supports a specific folder \
         (inbox, sentitems, drafts), full-text search across subject and body, \
         and an unread-only filter."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "folder": {
                    "type": "string",
                    "description": "Mail folder, e.g. 'inbox' or 'sentitems'. Defaults to the inbox."
                },
                "search": {
                    "type": "string",
                    "description": "Full-text search over subject, body, and sender"
                },
                "unreadOnly": {
                    "type": "boolean",
                    "default": false,
                    "description": "Only return unread messages"
                },
                "limit": {
                    "type": "integer",
                    "default": 10,
                    "description": "Maximum messages to return (1-50)"
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
        let params: ListMailInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        if params.limit < 1 || params.limit > MAX_MAIL_LIMIT {
            return Err(ToolError::validation(
                "limit",
                format!("must be between 1 and {MAX_MAIL_LIMIT}"),
            ));
        }

        let messages = ctx
            .graph
            .list_messages(
                token,
                params.folder.as_deref(),
                params.search.as_deref(),
                params.unread_only,
                params.limit,
            )
            .await
            .map_err(ToolError::from)?;

        match params.response_format.unwrap_or_else(|| ctx.default_format()) {
            ResponseFormat::Markdown => Ok(formatters::format_messages_markdown(&messages)),
            ResponseFormat::Json => {
                let compact =
                    messages.iter().map(formatters::compact_message).collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&compact)?)
            }
        }
    }
}

/// Mail sending tool.
pub struct SendMailTool;

#[async_trait::async_trait]
impl McpTool for SendMailTool {
    fn name(&self) -> &'static str {
        "send_mail"
    }

    fn description(&self) -> &'static str {
        "Send a mail message from the signed-in user's mailbox. The message \
         is sent immediately and saved to Sent Items."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Recipient email addresses"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Message body"
                },
                "cc": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "CC email addresses"
                },
                "html": {
                    "type": "boolean",
                    "default": false,
                    "description": "Send the body as HTML instead of plain text"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SendMailInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        if params.to.is_empty() {
            return Err(ToolError::validation("to", "must contain at least one recipient"));
        }
        if let Some(bad) = params.to.iter().chain(params.cc.iter().flatten()).find(|a| !a.contains('@'))
        {
            return Err(ToolError::validation("to", format!("'{bad}' is not an email address")));
        }

        ctx.graph
            .send_mail(
                token,
                &params.to,
                params.cc.as_deref(),
                &params.subject,
                &params.body,
                params.html,
            )
            .await
            .map_err(ToolError::from)?;

        Ok(format!("Mail sent to {}", params.to.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::graph::GraphClient;
    use crate::server::oauth::types::GrantProps;
    use crate::store::MemoryKvStore;

    fn test_ctx() -> ToolContext {
        let config = Config::for_testing("http://127.0.0.1:9");
        let graph = Arc::new(GraphClient::new(&config, Arc::new(MemoryKvStore::new())).unwrap());
        ToolContext::new(
            graph,
            GrantProps {
                upstream_access_token: Some("graph-token".to_string()),
                ..GrantProps::default()
            },
        )
    }

    #[tokio::test]
    async fn test_send_mail_rejects_empty_recipients() {
        let err = SendMailTool
            .execute(&test_ctx(), json!({"to": [], "subject": "s", "body": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_send_mail_rejects_bad_address() {
        let err = SendMailTool
            .execute(
                &test_ctx(),
                json!({"to": ["not-an-address"], "subject": "s", "body": "b"}),
            )
            .await
            .unwrap_err();
        assert!(err.to_user_message().contains("not-an-address"));
    }

    #[tokio::test]
    async fn test_list_mail_rejects_oversized_limit() {
        let err = ListMailTool
            .execute(&test_ctx(), json!({"limit": 500}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[test]
    fn test_list_mail_schema_names_fields() {
        let schema = ListMailTool.input_schema();
        assert!(schema["properties"]["unreadOnly"].is_object());
        assert!(schema["properties"]["responseFormat"].is_object());
    }
}
