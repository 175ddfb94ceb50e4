//! Command integration tests
//!
//! Each test runs the built binary against a temporary project tree.

pub mod config;
pub mod hash;
pub mod snapshot;
pub mod stats;
