//! Recording ban observer for testing.

use crate::application::ports::BanObserver;
use crate::domain::{message::Event, source::SourceIdentity};
use std::sync::Mutex;

/// One shadow-rejected event as seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedHit {
    pub source: SourceIdentity,
    pub event_id: String,
    pub pubkey: String,
    pub kind: u64,
}

/// Observer that records every banned hit.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    hits: Mutex<Vec<BannedHit>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All hits recorded so far.
    pub fn hits(&self) -> Vec<BannedHit> {
        self.hits
            .lock()
            .expect("RecordingObserver mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Number of hits recorded so far.
    pub fn count(&self) -> usize {
        self.hits
            .lock()
            .expect("RecordingObserver mutex poisoned - a test thread panicked while holding the lock")
            .len()
    }
}

impl BanObserver for RecordingObserver {
    fn on_shadow_reject(&self, source: &SourceIdentity, event: &Event) {
        self.hits
            .lock()
            .expect("RecordingObserver mutex poisoned - a test thread panicked while holding the lock")
            .push(BannedHit {
                source: source.clone(),
                event_id: event.id.clone(),
                pubkey: event.pubkey.clone(),
                kind: event.kind,
            });
    }
}
