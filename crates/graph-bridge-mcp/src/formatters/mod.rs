//! Output formatting for tool responses.
//!
//! Markdown for human-readable output, compact JSON for machine consumption.

mod json;
mod markdown;

pub use json::{compact_contact, compact_drive_item, compact_event, compact_message, compact_user};
pub use markdown::{
    format_contacts_markdown, format_drive_items_markdown, format_event_markdown,
    format_events_markdown, format_message_markdown, format_messages_markdown,
    format_profile_markdown,
};
