//! Data models for Microsoft Graph entities.
//!
//! All models use `#[serde(default)]` for optional fields and
//! `#[serde(rename_all = "camelCase")]` to match Graph naming.

use serde::{Deserialize, Serialize};

/// Collection wrapper Graph returns for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphList<T> {
    /// Page of results.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// Link to the next page, if any.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Signed-in user profile (`/me`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Directory object id.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Primary SMTP address.
    #[serde(default)]
    pub mail: Option<String>,

    /// UPN, usually the sign-in address.
    #[serde(default)]
    pub user_principal_name: Option<String>,

    /// Job title.
    #[serde(default)]
    pub job_title: Option<String>,

    /// Office location.
    #[serde(default)]
    pub office_location: Option<String>,
}

impl User {
    /// Display name, falling back to the UPN.
    #[must_use]
    pub fn name_or_upn(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.user_principal_name.as_deref())
            .unwrap_or("(unknown user)")
    }

    /// Best available email address.
    #[must_use]
    pub fn best_email(&self) -> Option<&str> {
        self.mail.as_deref().or(self.user_principal_name.as_deref())
    }
}

/// Email address with optional display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// SMTP address.
    #[serde(default)]
    pub address: Option<String>,
}

/// Message sender or recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Wrapped email address.
    #[serde(default)]
    pub email_address: Option<EmailAddress>,
}

impl Recipient {
    /// Display name, falling back to the address.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.email_address {
            Some(addr) => {
                addr.name.as_deref().or(addr.address.as_deref()).unwrap_or("(unknown)")
            }
            None => "(unknown)",
        }
    }
}

/// Mail message (list view, no body).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message id.
    pub id: String,

    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,

    /// First ~255 characters of the body.
    #[serde(default)]
    pub body_preview: Option<String>,

    /// Sender.
    #[serde(default)]
    pub from: Option<Recipient>,

    /// Delivery time (ISO 8601).
    #[serde(default)]
    pub received_date_time: Option<String>,

    /// Read flag.
    #[serde(default)]
    pub is_read: bool,

    /// Attachment flag.
    #[serde(default)]
    pub has_attachments: bool,

    /// Link to open the message in Outlook.
    #[serde(default)]
    pub web_link: Option<String>,
}

impl Message {
    /// Subject, or a placeholder for empty subjects.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        match self.subject.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "(no subject)",
        }
    }

    /// Sender label for list output.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.from.as_ref().map_or("(unknown)", Recipient::label)
    }
}

/// Date/time with time zone, as Graph represents event boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    /// Local date-time, e.g. `2026-03-01T09:00:00.0000000`.
    pub date_time: String,

    /// IANA or Windows time zone name.
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// Event location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Online meeting info attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeetingInfo {
    /// Join URL.
    #[serde(default)]
    pub join_url: Option<String>,
}

/// Calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Event id.
    pub id: String,

    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,

    /// Start boundary.
    #[serde(default)]
    pub start: Option<DateTimeTimeZone>,

    /// End boundary.
    #[serde(default)]
    pub end: Option<DateTimeTimeZone>,

    /// Location.
    #[serde(default)]
    pub location: Option<Location>,

    /// Organizer.
    #[serde(default)]
    pub organizer: Option<Recipient>,

    /// All-day flag.
    #[serde(default)]
    pub is_all_day: bool,

    /// Online meeting info, if the event has one.
    #[serde(default)]
    pub online_meeting: Option<OnlineMeetingInfo>,

    /// Link to open the event in Outlook.
    #[serde(default)]
    pub web_link: Option<String>,
}

impl CalendarEvent {
    /// Subject, or a placeholder for untitled events.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        match self.subject.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "(untitled event)",
        }
    }

    /// Location display name, if any.
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.display_name.as_deref())
    }

    /// Online meeting join URL, if any.
    #[must_use]
    pub fn join_url(&self) -> Option<&str> {
        self.online_meeting.as_ref().and_then(|m| m.join_url.as_deref())
    }
}

/// Marker object present on folder drive items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    /// Number of children.
    #[serde(default)]
    pub child_count: Option<i64>,
}

/// Marker object present on file drive items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// OneDrive file or folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    /// Item id.
    pub id: String,

    /// File or folder name.
    #[serde(default)]
    pub name: Option<String>,

    /// Size in bytes.
    #[serde(default)]
    pub size: Option<i64>,

    /// Link to open the item.
    #[serde(default)]
    pub web_url: Option<String>,

    /// Last modification time (ISO 8601).
    #[serde(default)]
    pub last_modified_date_time: Option<String>,

    /// Present when the item is a folder.
    #[serde(default)]
    pub folder: Option<FolderFacet>,

    /// Present when the item is a file.
    #[serde(default)]
    pub file: Option<FileFacet>,
}

impl DriveItem {
    /// Check if this item is a folder.
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    /// Name, or a placeholder.
    #[must_use]
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Personal contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Contact id.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Email addresses.
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,

    /// Mobile phone number.
    #[serde(default)]
    pub mobile_phone: Option<String>,

    /// Company name.
    #[serde(default)]
    pub company_name: Option<String>,
}

impl Contact {
    /// First email address, if any.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.iter().find_map(|e| e.address.as_deref())
    }

    /// Display name, or a placeholder.
    #[must_use]
    pub fn name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or("(unnamed contact)")
    }
}
