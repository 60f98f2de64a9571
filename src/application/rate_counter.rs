//! Rolling request counter per source key.
//!
//! Every request rewrites its key with a fresh TTL, so the window is anchored
//! at the most recent request. A key only drains back to zero after a quiet
//! gap of at least one interval.

use crate::application::ports::{KeyValueStore, StoreError};
use std::time::Duration;

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    /// Whether the request breached the limit
    pub over_limit: bool,
    /// Requests already counted in the window before this one
    pub prior_count: u64,
}

/// Counts requests per key through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct RateCounter<S> {
    store: S,
}

impl<S> RateCounter<S>
where
    S: KeyValueStore,
{
    /// Create a counter over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Count one request for `key` and report whether it breached `max`.
    ///
    /// The increment is always written, even past the limit. The comparison
    /// uses the count before this request, so exactly `max` requests pass
    /// before the first breach.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn check_and_increment(
        &self,
        key: &str,
        max: u64,
        interval: Duration,
    ) -> Result<CounterOutcome, StoreError> {
        let count = self.store.increment(key, interval).await?;
        let prior_count = u64::try_from(count.saturating_sub(1)).unwrap_or(0);

        Ok(CounterOutcome {
            over_limit: prior_count >= max,
            prior_count,
        })
    }

    /// Current count for `key` without touching it.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn count(&self, key: &str) -> Result<u64, StoreError> {
        let value = self.store.get(key).await?.unwrap_or(0);
        Ok(u64::try_from(value).unwrap_or(0))
    }
}
