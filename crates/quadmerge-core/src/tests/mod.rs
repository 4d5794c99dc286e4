//! Crate-level tests that drive the whole engine.
//!
//! - **Determinism tests**: same seed and same moves give the same game
//! - **Integration tests**: scripted turns through every phase
//! - **Helper functions**: scripted engine and board setup
//!
//! # Test Structure
//!
//! - `determinism.rs`: seeded replay and hash comparisons
//! - `integration.rs`: scenario and property tests of `process_move`
//! - `helpers.rs`: setup utilities

mod helpers;
mod integration;

pub use helpers::*;
