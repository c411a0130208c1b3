//! Input models for MCP tool parameters.

use serde::{Deserialize, Serialize};

use super::ResponseFormat;

/// Input for reading the signed-in user's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    /// Output format. Defaults to the connecting client's preference.
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

/// Input for listing mail messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMailInput {
    /// Mail folder, e.g. "inbox" or "sentitems". Defaults to the inbox.
    #[serde(default)]
    pub folder: Option<String>,

    /// Full-text search query over subject, body, and sender.
    #[serde(default)]
    pub search: Option<String>,

    /// Only return unread messages.
    #[serde(default)]
    pub unread_only: bool,

    /// Maximum messages to return.
    #[serde(default = "default_mail_limit")]
    pub limit: i32,

    /// Output format. Defaults to the connecting client's preference.
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

fn default_mail_limit() -> i32 {
    10
}

/// Input for sending a mail message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMailInput {
    /// Recipient addresses.
    pub to: Vec<String>,

    /// Subject line.
    pub subject: String,

    /// Message body.
    pub body: String,

    /// CC addresses.
    #[serde(default)]
    pub cc: Option<Vec<String>>,

    /// Send the body as HTML instead of plain text.
    #[serde(default)]
    pub html: bool,
}

/// Input for listing upcoming calendar events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarViewInput {
    /// Window start (ISO 8601). Defaults to now.
    #[serde(default)]
    pub start: Option<String>,

    /// Window length in days.
    #[serde(default = "default_days")]
    pub days: i32,

    /// Maximum events to return.
    #[serde(default = "default_mail_limit")]
    pub limit: i32,

    /// Output format. Defaults to the connecting client's preference.
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

fn default_days() -> i32 {
    7
}

/// Input for creating a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    /// Subject line.
    pub subject: String,

    /// Start time (ISO 8601, no offset), e.g. `2026-03-01T09:00:00`.
    pub start: String,

    /// End time (ISO 8601, no offset).
    pub end: String,

    /// Time zone for start and end.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Plain-text body.
    #[serde(default)]
    pub body: Option<String>,

    /// Location display name.
    #[serde(default)]
    pub location: Option<String>,

    /// Attendee email addresses.
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Input for listing or searching OneDrive files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesInput {
    /// Folder path relative to the drive root, e.g. "Documents/Reports".
    /// Defaults to the root.
    #[serde(default)]
    pub folder: Option<String>,

    /// Search query across the whole drive. When set, `folder` is ignored.
    #[serde(default)]
    pub search: Option<String>,

    /// Maximum items to return.
    #[serde(default = "default_list_limit")]
    pub limit: i32,

    /// Output format. Defaults to the connecting client's preference.
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

fn default_list_limit() -> i32 {
    20
}

/// Input for listing contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsInput {
    /// Name or email fragment to filter by.
    #[serde(default)]
    pub search: Option<String>,

    /// Maximum contacts to return.
    #[serde(default = "default_list_limit")]
    pub limit: i32,

    /// Output format. Defaults to the connecting client's preference.
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_mail_defaults() {
        let json = "{}";
        let input: ListMailInput = serde_json::from_str(json).unwrap();

        assert!(input.folder.is_none());
        assert!(input.search.is_none());
        assert!(!input.unread_only);
        assert_eq!(input.limit, 10);
        assert!(input.response_format.is_none());
    }

    #[test]
    fn test_calendar_view_defaults() {
        let json = "{}";
        let input: CalendarViewInput = serde_json::from_str(json).unwrap();

        assert!(input.start.is_none());
        assert_eq!(input.days, 7);
        assert_eq!(input.limit, 10);
    }

    #[test]
    fn test_create_event_defaults() {
        let json = r#"{
            "subject": "Standup",
            "start": "2026-03-01T09:00:00",
            "end": "2026-03-01T09:15:00"
        }"#;
        let input: CreateEventInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.time_zone, "UTC");
        assert!(input.attendees.is_none());
    }

    #[test]
    fn test_response_format_override() {
        let json = r#"{"responseFormat": "json"}"#;
        let input: ListMailInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.response_format, Some(ResponseFormat::Json));
    }
}
