//! VFS Snapshotter - turns directory trees on disk into snapshots
//!
//! This crate provides:
//! - A depth-first directory walker that follows symbolic links
//! - Default excludes for version control and editor files
//! - Filters applied while walking
//! - A concurrent string interner for file names
//! - Walk and snapshot statistics

pub mod error;
pub mod excludes;
pub mod filter;
pub mod interner;
pub mod snapshotter;
pub mod statistics;

// Re-export main types for convenience
pub use error::{Result, SnapshotterError};
pub use excludes::{DefaultExcludes, DEFAULT_EXCLUDES};
pub use filter::{DepthFilter, SnapshottingFilter};
pub use interner::StringInterner;
pub use snapshotter::{DirectorySnapshotter, SnapshotOutcome};
pub use statistics::{SnapshotStatistics, WalkStatistics};
