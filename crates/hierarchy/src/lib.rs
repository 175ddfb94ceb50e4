//! VFS Hierarchy - persistent snapshot trie and the virtual file system
//!
//! This crate provides:
//! - Size-tiered child maps keyed by compressed path edges
//! - The immutable `SnapshotHierarchy` with store, invalidate and lookup
//! - Diff listeners reporting added and removed snapshots
//! - An atomically swapped root for concurrent readers and one writer

pub mod atomic;
pub mod child_map;
pub mod diff;
pub mod error;
pub mod hierarchy;
pub mod node;
pub mod vfs;

// Re-export main types for convenience
pub use atomic::AtomicSnapshotHierarchyReference;
pub use child_map::ChildMap;
pub use diff::{
    NodeDiffListener, NoopDiffListener, SnapshotCollectingDiffListener, SnapshotDiffPublisher,
};
pub use error::{Result, VfsError};
pub use hierarchy::SnapshotHierarchy;
pub use node::FileSystemNode;
pub use vfs::VirtualFileSystem;
