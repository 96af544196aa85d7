//! Integration and determinism tests for the arena lifecycle.
//!
//! - **Determinism tests**: the same seed and catalog build identical arenas
//! - **Integration tests**: full reset/build/tick cycles through
//!   [`TrainingArena`](crate::training::TrainingArena)
//! - **Helper functions**: catalog and controller factories
//!
//! # Test Structure
//!
//! - `determinism.rs`: seeded and reseeded builds
//! - `integration.rs`: selection, merging, placement and lights end to end
//! - `helpers.rs`: test setup utilities and factory functions

mod helpers;
mod integration;
