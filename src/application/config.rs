//! Rate limit configuration.
//!
//! Built once at startup through [`RateLimitConfigBuilder`], validated, and
//! handed to the decision engine.

use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Default rolling window length.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(60_000);

/// Default requests allowed per window.
pub const DEFAULT_MAX: u64 = 10;

/// Default store connection string.
pub const DEFAULT_DATABASE_URL: &str = "memory://";

/// Longest accepted window or ban duration.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Error returned when building a [`RateLimitConfig`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The rate window must be longer than zero
    #[error("interval must be greater than 0")]
    ZeroInterval,
    /// A duration exceeds [`MAX_DURATION`]
    #[error("{name} of {millis}ms exceeds the maximum of one year")]
    DurationTooLong {
        /// Option name
        name: &'static str,
        /// Requested length in milliseconds
        millis: u128,
    },
    /// The store URL scheme is not recognised
    #[error("unsupported database url {0:?}: expected memory:// or redis://")]
    UnsupportedStore(String),
    /// A Redis URL was given but Redis support is not compiled in
    #[error("database url {0:?} needs the redis-storage feature")]
    RedisDisabled(String),
}

/// Store backend selected by the database URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    /// Process-local in-memory store
    Memory,
    /// Redis server at the given URL
    Redis(String),
}

impl StoreUrl {
    /// Parse a connection string.
    ///
    /// # Errors
    /// Returns `ConfigError::UnsupportedStore` for unknown schemes.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        if url == "memory" || url.starts_with("memory://") {
            Ok(StoreUrl::Memory)
        } else if url.starts_with("redis://")
            || url.starts_with("rediss://")
            || url.starts_with("redis+unix://")
        {
            Ok(StoreUrl::Redis(url.to_string()))
        } else {
            Err(ConfigError::UnsupportedStore(url.to_string()))
        }
    }
}

/// Validated options for the decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    interval: Duration,
    ban_interval: Duration,
    max: u64,
    whitelist: BTreeSet<String>,
    database_url: String,
    store: StoreUrl,
}

impl RateLimitConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::new()
    }

    /// Rolling window length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shadow-ban length after a breach. Zero disables bans.
    pub fn ban_interval(&self) -> Duration {
        self.ban_interval
    }

    /// Whether breaches arm a shadow-ban.
    pub fn bans_enabled(&self) -> bool {
        !self.ban_interval.is_zero()
    }

    /// Requests allowed per window before a breach.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Source values exempt from counting.
    pub fn whitelist(&self) -> &BTreeSet<String> {
        &self.whitelist
    }

    /// Whether `value` is exempt from counting.
    pub fn is_whitelisted(&self, value: &str) -> bool {
        self.whitelist.contains(value)
    }

    /// Raw store connection string.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Store backend the connection string selects.
    pub fn store(&self) -> &StoreUrl {
        &self.store
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            ban_interval: Duration::ZERO,
            max: DEFAULT_MAX,
            whitelist: BTreeSet::new(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            store: StoreUrl::Memory,
        }
    }
}

/// Builder for constructing a [`RateLimitConfig`].
#[derive(Debug, Clone)]
pub struct RateLimitConfigBuilder {
    interval: Duration,
    ban_interval: Duration,
    max: u64,
    whitelist: BTreeSet<String>,
    database_url: String,
}

impl RateLimitConfigBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            interval: defaults.interval,
            ban_interval: defaults.ban_interval,
            max: defaults.max,
            whitelist: defaults.whitelist,
            database_url: defaults.database_url,
        }
    }

    /// Set the rolling window length.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the shadow-ban length. Zero disables bans.
    pub fn with_ban_interval(mut self, ban_interval: Duration) -> Self {
        self.ban_interval = ban_interval;
        self
    }

    /// Set how many requests are allowed per window.
    pub fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    /// Set source values exempt from counting.
    pub fn with_whitelist<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.whitelist = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the store connection string.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if the interval is zero, a duration exceeds one
    /// year, or the database URL is not supported.
    pub fn build(self) -> Result<RateLimitConfig, ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        for (name, duration) in [("interval", self.interval), ("ban_interval", self.ban_interval)] {
            if duration > MAX_DURATION {
                return Err(ConfigError::DurationTooLong {
                    name,
                    millis: duration.as_millis(),
                });
            }
        }

        let store = StoreUrl::parse(&self.database_url)?;
        #[cfg(not(feature = "redis-storage"))]
        if let StoreUrl::Redis(url) = &store {
            return Err(ConfigError::RedisDisabled(url.clone()));
        }

        Ok(RateLimitConfig {
            interval: self.interval,
            ban_interval: self.ban_interval,
            max: self.max,
            whitelist: self.whitelist,
            database_url: self.database_url,
            store,
        })
    }
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
