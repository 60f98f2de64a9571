//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::{message::Event, source::SourceIdentity};
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error returned by a [`KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis command or connection failure
    #[cfg(feature = "redis-storage")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    /// A stored value could not be read as a counter
    #[error("value under key {key:?} is not an integer: {value:?}")]
    CorruptValue {
        /// Full storage key
        key: String,
        /// Raw stored value
        value: String,
    },
    /// The backend cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for a key-value store with per-key expiry.
///
/// Values are integers. A key whose TTL has elapsed reads as absent. Each
/// write resets the TTL from the time of the write.
///
/// Infrastructure provides `InMemoryStore` and, with the `redis-storage`
/// feature, `RedisStore`.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read the value under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<i64>, StoreError>> + Send;

    /// Store `value` under `key`, overwriting any prior value and expiry.
    fn set(
        &self,
        key: &str,
        value: i64,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically add one to the value under `key` and reset its expiry.
    ///
    /// An absent or expired key counts from zero. Returns the new value.
    /// Concurrent calls for the same key never lose an increment.
    fn increment(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

/// Port notified whenever a banned source is shadow-rejected.
///
/// Infrastructure provides `TracingBanObserver`, which logs the hit.
pub trait BanObserver: Send + Sync + Debug {
    /// Called once per shadow-rejected event.
    fn on_shadow_reject(&self, source: &SourceIdentity, event: &Event);
}
