//! Command-line arguments for the `relay-throttle` binary.
//!
//! Every option can also come from a `RELAY_THROTTLE_*` environment variable.

use crate::application::config::{
    ConfigError, RateLimitConfig, DEFAULT_DATABASE_URL, DEFAULT_MAX,
};
use clap::Parser;
use std::time::Duration;

/// Default purge period for the in-memory store, in milliseconds.
pub const DEFAULT_PURGE_INTERVAL_MS: u64 = 60_000;

/// Rate-limiting write policy for relay plugin pipelines.
///
/// Reads one JSON input message per line on stdin and writes one verdict per
/// line on stdout. Logs go to stderr.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "relay-throttle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Rolling window length in milliseconds.
    #[arg(long, env = "RELAY_THROTTLE_INTERVAL", default_value_t = 60_000)]
    pub interval: u64,

    /// Shadow-ban length in milliseconds after a breach. 0 disables bans.
    #[arg(long, env = "RELAY_THROTTLE_BAN_INTERVAL", default_value_t = 0)]
    pub ban_interval: u64,

    /// Requests allowed per window before a breach.
    #[arg(long, env = "RELAY_THROTTLE_MAX", default_value_t = DEFAULT_MAX)]
    pub max: u64,

    /// Source value exempt from counting. Repeat or separate with commas.
    #[arg(long, env = "RELAY_THROTTLE_WHITELIST", value_delimiter = ',')]
    pub whitelist: Vec<String>,

    /// Store connection string: memory:// or redis://host[:port][/db].
    #[arg(long, env = "RELAY_THROTTLE_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// How often the in-memory store drops expired entries, in milliseconds.
    #[arg(long, env = "RELAY_THROTTLE_PURGE_INTERVAL", default_value_t = DEFAULT_PURGE_INTERVAL_MS)]
    pub purge_interval: u64,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the validated engine configuration from these arguments.
    ///
    /// # Errors
    /// Returns `ConfigError` if validation fails.
    pub fn to_config(&self) -> Result<RateLimitConfig, ConfigError> {
        RateLimitConfig::builder()
            .with_interval(Duration::from_millis(self.interval))
            .with_ban_interval(Duration::from_millis(self.ban_interval))
            .with_max(self.max)
            .with_whitelist(self.whitelist.iter().map(|v| v.trim()).filter(|v| !v.is_empty()))
            .with_database_url(self.database_url.clone())
            .build()
    }

    /// Purge period for the in-memory store.
    pub fn purge_period(&self) -> Duration {
        Duration::from_millis(self.purge_interval.max(1))
    }
}
