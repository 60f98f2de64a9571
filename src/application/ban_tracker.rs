//! Escalating shadow-ban state per source key.
//!
//! A ban is a single record under `"<key>-banned"` that expires on its own.
//! It does not depend on the rate counter: it clears when its TTL elapses
//! even if traffic from the source is still heavy.

use crate::application::ports::{KeyValueStore, StoreError};
use std::time::Duration;

/// Suffix appended to a source key to form its ban key.
pub const BAN_KEY_SUFFIX: &str = "-banned";

/// Storage key holding the ban record for `key`.
pub fn ban_key(key: &str) -> String {
    format!("{key}{BAN_KEY_SUFFIX}")
}

/// Tracks bans through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct BanTracker<S> {
    store: S,
}

impl<S> BanTracker<S>
where
    S: KeyValueStore,
{
    /// Create a tracker over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Ban `key` for `ban_interval`. Does nothing for a zero interval.
    ///
    /// Banning an already-banned key restarts its ban.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn ban(&self, key: &str, ban_interval: Duration) -> Result<(), StoreError> {
        if ban_interval.is_zero() {
            return Ok(());
        }
        self.store.set(&ban_key(key), 1, ban_interval).await
    }

    /// Whether `key` is currently banned.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn is_banned(&self, key: &str) -> Result<bool, StoreError> {
        let record = self.store.get(&ban_key(key)).await?;
        Ok(record.is_some_and(|flag| flag != 0))
    }
}
