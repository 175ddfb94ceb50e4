//! VFS Core - snapshot primitives for the virtual file system
//!
//! This crate provides the leaf layer of the snapshot hierarchy:
//! - BLAKE3 content hashes and well-known signatures
//! - Allocation-free path comparison
//! - The stat call and file metadata
//! - Immutable file and directory snapshots
//! - The Merkle directory snapshot builder

pub mod builder;
pub mod error;
pub mod hash;
pub mod path;
pub mod snapshot;
pub mod stat;

// Re-export main types for convenience
pub use builder::{EmptyDirectoryHandling, MerkleDirectorySnapshotBuilder};
pub use error::{SnapshotError, StatError};
pub use hash::{DefaultFileHasher, FileHasher, HashCode, IncrementalHasher};
pub use path::{CaseSensitivity, PathRelationship, RelativePath};
pub use snapshot::{
    DirectorySnapshot, FileSystemLocationSnapshot, MetadataSnapshot, SnapshotHierarchyVisitor,
    SnapshotKind, SnapshotVisitResult,
};
pub use stat::{AccessType, DefaultStat, FileMetadata, FileType, Stat};
