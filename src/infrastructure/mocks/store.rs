//! Store double for error paths.

use crate::application::ports::{KeyValueStore, StoreError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Store whose every call fails with `StoreError::Unavailable`.
///
/// Counts the calls it rejected so tests can check whether the engine
/// reached the store at all.
#[derive(Debug, Clone)]
pub struct FailingStore {
    reason: String,
    calls: Arc<AtomicU64>,
}

impl FailingStore {
    /// Create a store that fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<i64>, StoreError> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: i64, _ttl: Duration) -> Result<(), StoreError> {
        self.fail()
    }

    async fn increment(&self, _key: &str, _ttl: Duration) -> Result<i64, StoreError> {
        self.fail()
    }
}
