//! Verdicts written back to the relay.

use serde::{Deserialize, Serialize};

/// Message attached to rate-limit rejections.
pub const RATE_LIMITED_MSG: &str = "rate-limited: too many requests";

/// What the relay should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Store and broadcast the event
    Accept,
    /// Refuse the event and tell the client why
    Reject,
    /// Pretend to accept the event but drop it
    ShadowReject,
}

/// Decision for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Id of the judged event
    pub id: String,
    /// Action to take
    pub action: Action,
    /// Client-facing message, empty unless rejected
    pub msg: String,
}

impl Verdict {
    /// Accept the event.
    pub fn accept(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: Action::Accept,
            msg: String::new(),
        }
    }

    /// Reject the event with a message.
    pub fn reject(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: Action::Reject,
            msg: msg.into(),
        }
    }

    /// Silently drop the event.
    pub fn shadow_reject(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: Action::ShadowReject,
            msg: String::new(),
        }
    }
}
