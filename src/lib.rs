//! # relay-throttle
//!
//! Rate limiting and shadow-ban write policy for relays that delegate event
//! acceptance to a line-delimited JSON plugin.
//!
//! Every incoming event is tagged with a source identity (an IP address or
//! another origin marker). The [`DecisionEngine`] answers each one with
//! `accept`, `reject`, or `shadowReject`:
//!
//! - Address sources (`IP4`/`IP6`) that are not whitelisted are counted in a
//!   rolling window. Past `max` requests they are rejected.
//! - When `ban_interval` is set, a breach also bans the source. While banned,
//!   its events are silently dropped even after the window drains.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_throttle::{DecisionEngine, InMemoryStore, InputMessage, RateLimitConfig};
//! use std::time::Duration;
//!
//! # async fn example(message: InputMessage) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RateLimitConfig::builder()
//!     .with_max(10)
//!     .with_interval(Duration::from_secs(60))
//!     .with_ban_interval(Duration::from_secs(600))
//!     .with_whitelist(["127.0.0.1"])
//!     .build()?;
//!
//! let engine = DecisionEngine::new(InMemoryStore::new(), config);
//! let verdict = engine.decide(&message).await?;
//! println!("{}", serde_json::to_string(&verdict)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Rolling Windows
//!
//! Each request rewrites its counter with a fresh TTL, so the window is
//! anchored at the latest request. A source that keeps publishing never sees
//! its count reset; it only drains after a quiet gap of one `interval`.
//!
//! ## Shared State
//!
//! State lives behind the [`KeyValueStore`] port. [`InMemoryStore`] serves a
//! single process. With the `redis-storage` feature, [`RedisStore`] lets
//! several relay processes share counters and bans. Both increment
//! atomically, so concurrent decisions for one source never lose a count.
//!
//! ## Known Key Collision
//!
//! Counter and ban keys are the raw source value, not scoped by source kind.
//! The ban check runs for every kind, whitelisted or not, so a non-address
//! source whose value equals a banned IP is shadow-rejected too.

// Domain layer - pure data types
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Command-line surface of the binary
pub mod cli;

// Re-export commonly used types for convenience
pub use domain::{
    message::{Event, InputMessage},
    source::{SourceIdentity, SourceKind},
    verdict::{Action, Verdict, RATE_LIMITED_MSG},
};

pub use application::{
    ban_tracker::{ban_key, BanTracker},
    config::{ConfigError, RateLimitConfig, RateLimitConfigBuilder, StoreUrl},
    engine::DecisionEngine,
    metrics::{Metrics, MetricsSnapshot},
    ports::{BanObserver, Clock, KeyValueStore, StoreError},
    rate_counter::{CounterOutcome, RateCounter},
};

pub use infrastructure::{
    clock::SystemClock,
    memory_store::InMemoryStore,
    observer::TracingBanObserver,
    transport::{TransportError, STORE_FAILURE_MSG},
};

#[cfg(feature = "redis-storage")]
pub use infrastructure::redis_store::{RedisStore, RedisStoreConfig};
