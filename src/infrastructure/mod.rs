//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Store implementations (in-memory, Redis)
//! - Ban observer logging through `tracing`
//! - The line-delimited JSON transport

pub mod clock;
pub mod memory_store;
pub mod observer;
pub mod transport;

#[cfg(feature = "redis-storage")]
pub mod redis_store;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for testing
/// decision behavior.
///
/// To use these mocks in integration tests, enable the feature:
/// ```toml
/// [dev-dependencies]
/// relay-throttle = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
