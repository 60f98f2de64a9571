//! Domain layer - pure data types with no I/O.
//!
//! This layer contains the concepts the decision engine works with:
//! - Source identities and their kinds
//! - Relay input messages and events
//! - Verdicts written back to the relay

pub mod message;
pub mod source;
pub mod verdict;
