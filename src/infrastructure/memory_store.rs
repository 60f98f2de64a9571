//! Process-local key-value store with TTLs.
//!
//! Provides concurrent, sharded storage for counters and ban records. Expiry
//! is lazy: expired entries read as absent and are dropped by
//! [`InMemoryStore::purge_expired`].

use crate::application::ports::{Clock, KeyValueStore, StoreError};
use crate::infrastructure::clock::SystemClock;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe sharded store backed by DashMap.
///
/// Increments run under the shard lock of their key, so the read, the add
/// and the TTL reset happen as one step. Clones share the same map.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    map: Arc<DashMap<String, Entry, ahash::RandomState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create a store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create a store driven by a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: Arc::new(DashMap::with_hasher(ahash::RandomState::new())),
            clock,
        }
    }

    fn deadline(now: Instant, ttl: Duration) -> Instant {
        now.checked_add(ttl)
            .unwrap_or_else(|| now + crate::application::config::MAX_DURATION)
    }

    /// Get the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.map.len())
    }

    /// Purge expired entries every `period` on a background task.
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn_purge_task(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "purged expired entries");
                }
            }
        })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let now = self.clock.now();
        Ok(self
            .map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Self::deadline(now, ttl),
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let now = self.clock.now();
        let mut entry = self.map.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: now,
        });
        if !entry.is_live(now) {
            entry.value = 0;
        }
        entry.value = entry.value.saturating_add(1);
        entry.expires_at = Self::deadline(now, ttl);
        Ok(entry.value)
    }
}
