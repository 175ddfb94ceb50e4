//! CLI command implementations

pub mod config;
pub mod hash;
pub mod snapshot;
pub mod stats;
