//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of decision logic.

pub mod clock;
pub mod layer;
pub mod observer;
pub mod store;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use observer::{BannedHit, RecordingObserver};
pub use store::FailingStore;
