//! Data models for Microsoft Graph entities and tool inputs.
//!
//! All models use `#[serde(default)]` for optional fields and
//! `#[serde(rename_all = "camelCase")]` to match Graph naming.

mod enums;
mod graph;
mod inputs;

pub use enums::{ClientKind, ResponseFormat};
pub use graph::{
    CalendarEvent, Contact, DateTimeTimeZone, DriveItem, EmailAddress, FileFacet, FolderFacet,
    GraphList, Location, Message, OnlineMeetingInfo, Recipient, User,
};
pub use inputs::*;
