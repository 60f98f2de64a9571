//! Relay input messages and the events they carry.
//!
//! Only the fields the engine reads are decoded strictly. Event fields it
//! never reads are carried as raw JSON and unknown message fields are
//! ignored, so the decoder keeps working as the relay protocol grows.

use crate::domain::source::{SourceIdentity, SourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A signed relay event.
///
/// Only `id`, `pubkey` and `kind` are decoded strictly. Every other field
/// (`created_at`, `tags`, `content`, `sig`, ...) is kept as raw JSON in
/// [`Event::rest`], so an oddly typed field the engine never reads cannot
/// fail the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (hex)
    pub id: String,
    /// Author public key (hex)
    pub pubkey: String,
    /// Event kind number
    pub kind: u64,
    /// Remaining event fields, untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Event {
    /// Build an event from the fields the engine reads.
    pub fn new(id: impl Into<String>, pubkey: impl Into<String>, kind: u64) -> Self {
        Self {
            id: id.into(),
            pubkey: pubkey.into(),
            kind,
            rest: Map::new(),
        }
    }
}

/// One line of relay input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMessage {
    /// Message type, `"new"` for freshly received events
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    /// The event to judge
    pub event: Event,
    /// Receive time in seconds
    #[serde(default)]
    pub received_at: Option<u64>,
    /// Origin kind
    pub source_type: SourceKind,
    /// Origin value, e.g. the client IP
    pub source_info: String,
}

impl InputMessage {
    /// Build a message for an event and its origin.
    pub fn new(event: Event, source_type: impl Into<SourceKind>, source_info: impl Into<String>) -> Self {
        Self {
            message_type: Some("new".to_string()),
            event,
            received_at: None,
            source_type: source_type.into(),
            source_info: source_info.into(),
        }
    }

    /// The source identity this message was tagged with.
    pub fn source(&self) -> SourceIdentity {
        SourceIdentity::new(self.source_type.clone(), self.source_info.clone())
    }
}
