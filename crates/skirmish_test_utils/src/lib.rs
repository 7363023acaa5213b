//! # Skirmish Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture spawning helpers and unit definitions
//! - A navigator that records every request it receives
//! - An in-memory snapshot store
//! - Determinism harness and property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
