//! Verdict metrics.
//!
//! Counts how many events received each action, for monitoring and for the
//! summary the binary logs when its input ends.

use crate::domain::verdict::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking decision outcomes.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Events accepted
    accepted: AtomicU64,
    /// Events rejected for exceeding the rate limit
    rejected: AtomicU64,
    /// Events silently dropped from banned sources
    shadow_rejected: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a verdict action.
    pub(crate) fn record(&self, action: Action) {
        let counter = match action {
            Action::Accept => &self.inner.accepted,
            Action::Reject => &self.inner.rejected,
            Action::ShadowReject => &self.inner.shadow_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of accepted events.
    pub fn accepted(&self) -> u64 {
        self.inner.accepted.load(Ordering::Relaxed)
    }

    /// Get the number of rejected events.
    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    /// Get the number of shadow-rejected events.
    pub fn shadow_rejected(&self) -> u64 {
        self.inner.shadow_rejected.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted(),
            rejected: self.rejected(),
            shadow_rejected: self.shadow_rejected(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Events accepted
    pub accepted: u64,
    /// Events rejected for exceeding the rate limit
    pub rejected: u64,
    /// Events silently dropped from banned sources
    pub shadow_rejected: u64,
}

impl MetricsSnapshot {
    /// Get the total number of decided events.
    pub fn total(&self) -> u64 {
        self.accepted
            .saturating_add(self.rejected)
            .saturating_add(self.shadow_rejected)
    }

    /// Fraction of events dropped either way (0.0 to 1.0).
    ///
    /// Returns 0.0 if no events have been decided.
    pub fn drop_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.rejected.saturating_add(self.shadow_rejected) as f64 / total as f64
        }
    }
}
