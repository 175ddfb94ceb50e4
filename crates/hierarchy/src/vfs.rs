//! Virtual file system facade over an atomically updated hierarchy

use crate::atomic::AtomicSnapshotHierarchyReference;
use crate::diff::SnapshotDiffPublisher;
use crate::error::{Result, VfsError};
use crate::hierarchy::SnapshotHierarchy;
use std::sync::Arc;
use tracing::debug;
use vfs_core::path::CaseSensitivity;
use vfs_core::{FileSystemLocationSnapshot, MetadataSnapshot};

/// In-memory view of the file system, shared between threads
#[derive(Debug)]
pub struct VirtualFileSystem {
    root: AtomicSnapshotHierarchyReference,
}

impl VirtualFileSystem {
    pub fn new(case_sensitivity: CaseSensitivity) -> Self {
        Self {
            root: AtomicSnapshotHierarchyReference::new(SnapshotHierarchy::new(case_sensitivity)),
        }
    }

    /// Like [`new`](Self::new), reporting every change to `publisher`
    pub fn with_publisher(
        case_sensitivity: CaseSensitivity,
        publisher: Arc<dyn SnapshotDiffPublisher>,
    ) -> Self {
        Self {
            root: AtomicSnapshotHierarchyReference::with_publisher(
                SnapshotHierarchy::new(case_sensitivity),
                publisher,
            ),
        }
    }

    /// The hierarchy as of now; later updates do not affect it
    pub fn current_root(&self) -> SnapshotHierarchy {
        self.root.get()
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.root.get().case_sensitivity()
    }

    pub fn find_metadata(&self, absolute_path: &str) -> Option<MetadataSnapshot> {
        self.root.get().find_metadata(absolute_path)
    }

    pub fn find_snapshot(&self, absolute_path: &str) -> Option<FileSystemLocationSnapshot> {
        self.root.get().find_snapshot(absolute_path)
    }

    pub fn root_snapshots(&self) -> Vec<FileSystemLocationSnapshot> {
        self.root.get().root_snapshots()
    }

    /// Store a complete snapshot at its own location
    pub fn store(&self, snapshot: FileSystemLocationSnapshot) -> Result<()> {
        self.root.update(|root, listener| {
            root.store(snapshot.absolute_path(), snapshot.clone(), listener)
        })
    }

    pub fn store_metadata(&self, absolute_path: &str, snapshot: MetadataSnapshot) -> Result<()> {
        self.root
            .update(|root, listener| root.store(absolute_path, snapshot, listener))
    }

    /// Invalidate several locations in one update
    pub fn invalidate<I, P>(&self, locations: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.root.update(|root, listener| {
            let mut count = 0usize;
            let updated = locations.into_iter().fold(root.clone(), |current, location| {
                count += 1;
                current.invalidate(location.as_ref(), listener)
            });
            debug!(count, "Invalidated VFS locations");
            updated
        })
    }

    pub fn invalidate_all(&self) -> Result<()> {
        debug!("Invalidating the whole VFS");
        self.root.update(|root, listener| root.invalidate("/", listener))
    }

    /// The complete snapshot at `absolute_path`, taking and storing one with
    /// `snapshot_fn` when none is known
    ///
    /// A snapshot that was taken but could not be announced to the diff
    /// publisher is still returned.
    pub fn read_location<F, E>(
        &self,
        absolute_path: &str,
        snapshot_fn: F,
    ) -> std::result::Result<FileSystemLocationSnapshot, E>
    where
        F: FnOnce(&str) -> std::result::Result<FileSystemLocationSnapshot, E>,
    {
        if let Some(snapshot) = self.find_snapshot(absolute_path) {
            return Ok(snapshot);
        }

        let snapshot = snapshot_fn(absolute_path)?;
        if let Err(VfsError::DiffPublication { source }) = self.store(snapshot.clone()) {
            debug!(path = absolute_path, "Stored snapshot without publishing: {}", source);
        }
        Ok(snapshot)
    }
}
