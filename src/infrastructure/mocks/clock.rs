//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Manually stepped clock.
///
/// Lets tests walk through rate windows and ban lifetimes without sleeping.
/// Clones share one offset, so advancing the clock handed to a test also
/// moves every store built from a clone of it.
///
/// # Examples
///
/// ```
/// use relay_throttle::infrastructure::mocks::MockClock;
/// use relay_throttle::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// clock.advance(Duration::from_millis(50));
///
/// assert_eq!(clock.now(), start + Duration::from_millis(50));
/// assert_eq!(clock.elapsed(), Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock frozen at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        // A poisoned lock only means another test thread panicked
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    /// Total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}
