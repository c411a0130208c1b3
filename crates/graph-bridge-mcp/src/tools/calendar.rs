//! Calendar tools: list_events, create_event.

use chrono::{Duration, Utc};
use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{CalendarViewInput, CreateEventInput, ResponseFormat};

/// Longest calendar window one call may request.
const MAX_WINDOW_DAYS: i32 = 90;

/// Calendar view tool.
pub struct ListEventsTool;

#[async_trait::async_trait]
impl McpTool for ListEventsTool {
    fn name(&self) -> &'static str {
        "list_events"
    }

    fn description(&self) -> &'static str {
        "List calendar events in a time window, earliest first. Defaults to \
         the next 7 days starting now. Recurring events are expanded into \
         their occurrences."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "start": {
                    "type": "string",
                    "description": "Window start (ISO 8601, e.g. '2026-03-01T00:00:00Z'). Defaults to now."
                },
                "days": {
                    "type": "integer",
                    "default": 7,
                    "description": "Window length in days (1-90)"
                },
                "limit": {
                    "type": "integer",
                    "default": 10,
                    "description": "Maximum events to return"
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
        let params: CalendarViewInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        if params.days < 1 || params.days > MAX_WINDOW_DAYS {
            return Err(ToolError::validation(
                "days",
                format!("must be between 1 and {MAX_WINDOW_DAYS}"),
            ));
        }

        let start = match params.start.as_deref() {
            Some(start) => start
                .parse::<chrono::DateTime<Utc>>()
                .map_err(|_| ToolError::validation("start", "must be an ISO 8601 timestamp"))?,
            None => Utc::now(),
        };
        let end = start + Duration::days(i64::from(params.days));

        let events = ctx
            .graph
            .calendar_view(token, &start.to_rfc3339(), &end.to_rfc3339(), params.limit)
            .await
            .map_err(ToolError::from)?;

        match params.response_format.unwrap_or_else(|| ctx.default_format()) {
            ResponseFormat::Markdown => Ok(formatters::format_events_markdown(&events)),
            ResponseFormat::Json => {
                let compact = events.iter().map(formatters::compact_event).collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&compact)?)
            }
        }
    }
}

/// Event creation tool.
pub struct CreateEventTool;

#[async_trait::async_trait]
impl McpTool for CreateEventTool {
    fn name(&self) -> &'static str {
        "create_event"
    }

    fn description(&self) -> &'static str {
        "Create an event on the signed-in user's default calendar. Attendees \
         receive an invitation; an online meeting is not created."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "Event subject"
                },
                "start": {
                    "type": "string",
                    "description": "Start time without offset, e.g. '2026-03-01T09:00:00'"
                },
                "end": {
                    "type": "string",
                    "description": "End time without offset"
                },
                "timeZone": {
                    "type": "string",
                    "default": "UTC",
                    "description": "IANA or Windows time zone for start and end"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text body"
                },
                "location": {
                    "type": "string",
                    "description": "Location display name"
                },
                "attendees": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Attendee email addresses"
                }
            },
            "required": ["subject", "start", "end"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: CreateEventInput = serde_json::from_value(input)?;
        let token = ctx.access_token()?;

        if params.subject.trim().is_empty() {
            return Err(ToolError::validation("subject", "must not be empty"));
        }

        let event = ctx
            .graph
            .create_event(
                token,
                &params.subject,
                &params.start,
                &params.end,
                &params.time_zone,
                params.body.as_deref(),
                params.location.as_deref(),
                params.attendees.as_deref(),
            )
            .await
            .map_err(ToolError::from)?;

        Ok(format!(
            "Created event \"{}\" ({} {} to {})",
            event.subject_or_default(),
            params.time_zone,
            params.start,
            params.end
        ))
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
    async fn test_list_events_rejects_bad_window() {
        let err =
            ListEventsTool.execute(&test_ctx(), json!({"days": 365})).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_events_rejects_bad_start() {
        let err = ListEventsTool
            .execute(&test_ctx(), json!({"start": "tomorrow-ish"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_event_rejects_blank_subject() {
        let err = CreateEventTool
            .execute(
                &test_ctx(),
                json!({"subject": "  ", "start": "2026-03-01T09:00:00", "end": "2026-03-01T10:00:00"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }
}
