//! Markdown output formatting.

use crate::models::{CalendarEvent, Contact, DriveItem, Message, User};

/// Format the signed-in user's profile as Markdown.
#[must_use]
pub fn format_profile_markdown(user: &User) -> String {
    let mut output = format!("# {}\n\n", user.name_or_upn());

    if let Some(email) = user.best_email() {
        output.push_str(&format!("**Email**: {email}\n\n"));
    }
    if let Some(title) = &user.job_title {
        output.push_str(&format!("**Title**: {title}\n\n"));
    }
    if let Some(office) = &user.office_location {
        output.push_str(&format!("**Office**: {office}\n\n"));
    }

    output
}

/// Format a list of mail messages as Markdown.
#[must_use]
pub fn format_messages_markdown(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages found.".to_string();
    }

    let mut output = format!("# Messages ({} results)\n\n", messages.len());

    for (i, message) in messages.iter().enumerate() {
        output.push_str(&format_message_markdown(message, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single message as Markdown.
#[must_use]
pub fn format_message_markdown(message: &Message, index: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("## {}. {}\n\n", index, message.subject_or_default()));
    output.push_str(&format!("**From**: {}\n\n", message.sender()));

    let mut meta = Vec::new();
    if let Some(received) = &message.received_date_time {
        meta.push(format!("**Received**: {received}"));
    }
    meta.push(format!("**Read**: {}", if message.is_read { "yes" } else { "no" }));
    if message.has_attachments {
        meta.push("**Attachments**: yes".to_string());
    }
    output.push_str(&format!("{}\n\n", meta.join(" | ")));

    if let Some(preview) = &message.body_preview {
        if !preview.is_empty() {
            output.push_str(&format!("{preview}\n\n"));
        }
    }

    if let Some(link) = &message.web_link {
        output.push_str(&format!("[Open in Outlook]({link})\n"));
    }

    output
}

/// Format a list of calendar events as Markdown.
#[must_use]
pub fn format_events_markdown(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }

    let mut output = format!("# Events ({} results)\n\n", events.len());

    for (i, event) in events.iter().enumerate() {
        output.push_str(&format_event_markdown(event, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single calendar event as Markdown.
#[must_use]
pub fn format_event_markdown(event: &CalendarEvent, index: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("## {}. {}\n\n", index, event.subject_or_default()));

    let mut meta = Vec::new();
    if let Some(start) = &event.start {
        meta.push(format!("**Start**: {}", start.date_time));
    }
    if let Some(end) = &event.end {
        meta.push(format!("**End**: {}", end.date_time));
    }
    if event.is_all_day {
        meta.push("**All day**".to_string());
    }
    output.push_str(&format!("{}\n\n", meta.join(" | ")));

    if let Some(location) = event.location_name() {
        output.push_str(&format!("**Location**: {location}\n\n"));
    }
    if let Some(organizer) = &event.organizer {
        output.push_str(&format!("**Organizer**: {}\n\n", organizer.label()));
    }
    if let Some(join) = event.join_url() {
        output.push_str(&format!("[Join online]({join})\n\n"));
    }
    if let Some(link) = &event.web_link {
        output.push_str(&format!("[Open in Outlook]({link})\n"));
    }

    output
}

/// Format a list of drive items as Markdown.
#[must_use]
pub fn format_drive_items_markdown(items: &[DriveItem]) -> String {
    if items.is_empty() {
        return "No files found.".to_string();
    }

    let mut output = format!("# Files ({} results)\n\n", items.len());

    for item in items {
        let marker = if item.is_folder() { "📁" } else { "📄" };
        let mut line = format!("- {} **{}**", marker, item.name_or_default());

        if let Some(size) = item.size {
            if !item.is_folder() {
                line.push_str(&format!(" ({})", format_size(size)));
            }
        }
        if let Some(modified) = &item.last_modified_date_time {
            line.push_str(&format!(" · modified {modified}"));
        }
        if let Some(url) = &item.web_url {
            line.push_str(&format!(" · [open]({url})"));
        }

        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format a list of contacts as Markdown.
#[must_use]
pub fn format_contacts_markdown(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "No contacts found.".to_string();
    }

    let mut output = format!("# Contacts ({} results)\n\n", contacts.len());

    for contact in contacts {
        let mut line = format!("- **{}**", contact.name_or_default());

        if let Some(email) = contact.primary_email() {
            line.push_str(&format!(" <{email}>"));
        }
        if let Some(phone) = &contact.mobile_phone {
            line.push_str(&format!(" · {phone}"));
        }
        if let Some(company) = &contact.company_name {
            line.push_str(&format!(" · {company}"));
        }

        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Human-readable file size.
fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_messages_markdown(&[]), "No messages found.");
        assert_eq!(format_events_markdown(&[]), "No events found.");
        assert_eq!(format_drive_items_markdown(&[]), "No files found.");
        assert_eq!(format_contacts_markdown(&[]), "No contacts found.");
    }

    #[test]
    fn test_message_list_formatting() {
        let message: Message = serde_json::from_str(
            r#"{
                "id": "m1",
                "subject": "Budget review",
                "from": {"emailAddress": {"name": "Dana", "address": "dana@contoso.com"}},
                "receivedDateTime": "2026-03-01T09:12:00Z",
                "isRead": false
            }"#,
        )
        .unwrap();

        let output = format_messages_markdown(&[message]);
        assert!(output.contains("# Messages (1 results)"));
        assert!(output.contains("Budget review"));
        assert!(output.contains("**From**: Dana"));
        assert!(output.contains("**Read**: no"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
