//! Redis-backed key-value store.
//!
//! Lets several relay processes share counters and bans through one Redis
//! server.
//!
//! ## Data model
//!
//! - Keys: the source key with a configurable prefix
//! - Values: plain integers (`1` marks a ban)
//! - TTL: millisecond expiry set with every write (`PX` / `PEXPIRE`)
//!
//! ## Atomicity
//!
//! [`KeyValueStore::increment`] sends `INCR` and `PEXPIRE` in one
//! `MULTI`/`EXEC` transaction, so concurrent processes never lose an
//! increment and the TTL always belongs to the latest write.
//!
//! ## Error handling
//!
//! Redis failures are returned as [`StoreError::Redis`]. Nothing is retried
//! here; the caller decides how a failed decision is reported.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_throttle::{DecisionEngine, RateLimitConfig, RedisStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RateLimitConfig::builder()
//!         .with_database_url("redis://127.0.0.1/")
//!         .build()
//!         .unwrap();
//!     let store = RedisStore::connect(config.database_url())
//!         .await
//!         .expect("Failed to connect to Redis");
//!     let engine = DecisionEngine::new(store, config);
//! }
//! ```

use crate::application::ports::{KeyValueStore, StoreError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::fmt;
use std::time::Duration;

/// Configuration for Redis storage.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for Redis keys (default: "relay-throttle:")
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "relay-throttle:".to_string(),
        }
    }
}

/// Redis-backed store for shared rate limiting.
///
/// Clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection, config })
    }

    /// Get the Redis key for a store key.
    fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Expiry in whole milliseconds, at least one.
    fn ttl_millis(ttl: Duration) -> u64 {
        u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    /// Delete every key under this store's prefix.
    ///
    /// Walks the keyspace with `SCAN`, so it is safe on a shared server but
    /// not cheap. Intended for tests and maintenance.
    ///
    /// # Errors
    /// Returns error if a `SCAN` or `DEL` fails.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let pattern = format!("{}*", self.config.key_prefix);
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                conn.del::<_, ()>(&keys).await?;
            }

            if next_cursor == 0 {
                return Ok(());
            }
            cursor = next_cursor;
        }
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            None => Ok(None),
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(StoreError::CorruptValue { key, value: raw }),
            },
        }
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.clone();

        conn.pset_ex::<_, _, ()>(&key, value, Self::ttl_millis(ttl))
            .await?;
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.clone();
        let ttl_ms = i64::try_from(Self::ttl_millis(ttl)).unwrap_or(i64::MAX);

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .pexpire(&key, ttl_ms)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::trace!(key = %key, count, "incremented counter");
        Ok(count)
    }
}
