//! JSON output formatting with token efficiency.

use serde_json::{Value, json};

use crate::models::{CalendarEvent, Contact, DriveItem, Message, User};

/// Create a compact profile representation for JSON output.
#[must_use]
pub fn compact_user(user: &User) -> Value {
    let mut obj = json!({
        "id": user.id,
        "name": user.name_or_upn(),
    });

    if let Some(email) = user.best_email() {
        obj["email"] = json!(email);
    }
    if let Some(title) = &user.job_title {
        obj["jobTitle"] = json!(title);
    }
    if let Some(office) = &user.office_location {
        obj["office"] = json!(office);
    }

    obj
}

/// Create a compact message representation for JSON output.
#[must_use]
pub fn compact_message(message: &Message) -> Value {
    let mut obj = json!({
        "id": message.id,
        "subject": message.subject_or_default(),
        "from": message.sender(),
        "isRead": message.is_read,
    });

    if let Some(received) = &message.received_date_time {
        obj["received"] = json!(received);
    }
    if message.has_attachments {
        obj["hasAttachments"] = json!(true);
    }
    if let Some(preview) = &message.body_preview {
        if !preview.is_empty() {
            obj["preview"] = json!(preview);
        }
    }
    if let Some(link) = &message.web_link {
        obj["webLink"] = json!(link);
    }

    obj
}

/// Create a compact event representation for JSON output.
#[must_use]
pub fn compact_event(event: &CalendarEvent) -> Value {
    let mut obj = json!({
        "id": event.id,
        "subject": event.subject_or_default(),
    });

    if let Some(start) = &event.start {
        obj["start"] = json!(start.date_time);
    }
    if let Some(end) = &event.end {
        obj["end"] = json!(end.date_time);
    }
    if event.is_all_day {
        obj["allDay"] = json!(true);
    }
    if let Some(location) = event.location_name() {
        obj["location"] = json!(location);
    }
    if let Some(organizer) = &event.organizer {
        obj["organizer"] = json!(organizer.label());
    }
    if let Some(join) = event.join_url() {
        obj["joinUrl"] = json!(join);
    }

    obj
}

/// Create a compact drive item representation for JSON output.
#[must_use]
pub fn compact_drive_item(item: &DriveItem) -> Value {
    let mut obj = json!({
        "id": item.id,
        "name": item.name_or_default(),
        "type": if item.is_folder() { "folder" } else { "file" },
    });

    if let Some(size) = item.size {
        obj["size"] = json!(size);
    }
    if let Some(modified) = &item.last_modified_date_time {
        obj["modified"] = json!(modified);
    }
    if let Some(url) = &item.web_url {
        obj["webUrl"] = json!(url);
    }

    obj
}

/// Create a compact contact representation for JSON output.
#[must_use]
pub fn compact_contact(contact: &Contact) -> Value {
    let mut obj = json!({
        "id": contact.id,
        "name": contact.name_or_default(),
    });

    if let Some(email) = contact.primary_email() {
        obj["email"] = json!(email);
    }
    if let Some(phone) = &contact.mobile_phone {
        obj["phone"] = json!(phone);
    }
    if let Some(company) = &contact.company_name {
        obj["company"] = json!(company);
    }

    obj
}
