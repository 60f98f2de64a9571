//! Source identities attached to incoming events.
//!
//! The relay tags every event with where it came from. Only address kinds
//! take part in request counting; every kind can still be shadow-banned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin kind reported by the relay alongside each event.
///
/// Unknown kinds are kept verbatim in [`SourceKind::Other`] rather than
/// rejected, so new relay versions never break decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    /// IPv4 client address
    Ip4,
    /// IPv6 client address
    Ip6,
    /// Event imported from a local file
    Import,
    /// Event streamed from another relay
    Stream,
    /// Event received through negentropy sync
    Sync,
    /// Any kind this crate does not know about
    Other(String),
}

impl SourceKind {
    /// Whether this kind identifies a network address.
    pub fn is_address(&self) -> bool {
        matches!(self, SourceKind::Ip4 | SourceKind::Ip6)
    }

    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Ip4 => "IP4",
            SourceKind::Ip6 => "IP6",
            SourceKind::Import => "Import",
            SourceKind::Stream => "Stream",
            SourceKind::Sync => "Sync",
            SourceKind::Other(name) => name,
        }
    }
}

impl From<String> for SourceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IP4" => SourceKind::Ip4,
            "IP6" => SourceKind::Ip6,
            "Import" => SourceKind::Import,
            "Stream" => SourceKind::Stream,
            "Sync" => SourceKind::Sync,
            _ => SourceKind::Other(value),
        }
    }
}

impl From<&str> for SourceKind {
    fn from(value: &str) -> Self {
        SourceKind::from(value.to_string())
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an event originated: a kind plus its raw value.
///
/// Storage keys derive from `value` alone. Two kinds that share a literal
/// value therefore share counter and ban records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    /// Origin kind
    pub kind: SourceKind,
    /// Raw value, e.g. `"1.1.1.1"`
    pub value: String,
}

impl SourceIdentity {
    /// Create a new source identity.
    pub fn new(kind: impl Into<SourceKind>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}
