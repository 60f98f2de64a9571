//! Clock adapters for time operations.
//!
//! `InMemoryStore` reads expiry deadlines from a [`Clock`]. Production uses
//! [`SystemClock`]; tests use `MockClock` (in `crate::infrastructure::mocks`,
//! available with the `test-helpers` feature or in test builds) to step
//! through windows and bans without sleeping.

use crate::application::ports::Clock;
use std::time::Instant;

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
