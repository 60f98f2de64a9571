//! Application layer - orchestration and business logic.
//!
//! This layer coordinates the domain logic and defines ports for infrastructure.

pub mod ban_tracker;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod ports;
pub mod rate_counter;
