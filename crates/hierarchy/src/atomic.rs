//! Thread-safe holder for the current hierarchy

use crate::diff::{
    NodeDiffListener, NoopDiffListener, SnapshotCollectingDiffListener, SnapshotDiffPublisher,
};
use crate::error::{Result, VfsError};
use crate::hierarchy::SnapshotHierarchy;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Serialises updates of a [`SnapshotHierarchy`] while readers proceed
///
/// Readers load the current root with one atomic read and never take a lock.
/// Writers hold the update lock for the whole read-compute-install cycle, so
/// no update is ever lost.
pub struct AtomicSnapshotHierarchyReference {
    /// Current root, swapped atomically
    root: ArcSwap<SnapshotHierarchy>,
    /// Held for the duration of one update
    update_lock: Mutex<()>,
    /// Receives the snapshot diff of every update
    publisher: Option<Arc<dyn SnapshotDiffPublisher>>,
}

impl AtomicSnapshotHierarchyReference {
    pub fn new(root: SnapshotHierarchy) -> Self {
        Self {
            root: ArcSwap::from_pointee(root),
            update_lock: Mutex::new(()),
            publisher: None,
        }
    }

    pub fn with_publisher(
        root: SnapshotHierarchy,
        publisher: Arc<dyn SnapshotDiffPublisher>,
    ) -> Self {
        Self {
            root: ArcSwap::from_pointee(root),
            update_lock: Mutex::new(()),
            publisher: Some(publisher),
        }
    }

    pub fn get(&self) -> SnapshotHierarchy {
        SnapshotHierarchy::clone(&self.root.load_full())
    }

    /// Replace the root with `update(current, listener)`
    ///
    /// The diff is published after the new root is installed. A failing
    /// publisher leaves the new root in place.
    ///
    /// # Panics
    ///
    /// If `update` returns a hierarchy with a different case sensitivity.
    pub fn update<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&SnapshotHierarchy, &mut dyn NodeDiffListener) -> SnapshotHierarchy,
    {
        let _guard = self.update_lock.lock();
        let current = self.get();

        let Some(publisher) = &self.publisher else {
            let updated = update(&current, &mut NoopDiffListener);
            self.install(&current, updated);
            return Ok(());
        };

        let mut listener = SnapshotCollectingDiffListener::new();
        let updated = update(&current, &mut listener);
        self.install(&current, updated);

        listener
            .publish_snapshot_diff(publisher.as_ref())
            .map_err(|source| {
                tracing::warn!(
                    removed = listener.removed().len(),
                    added = listener.added().len(),
                    "Failed to publish snapshot diff: {}",
                    source
                );
                VfsError::DiffPublication { source }
            })
    }

    fn install(&self, current: &SnapshotHierarchy, updated: SnapshotHierarchy) {
        assert_eq!(
            current.case_sensitivity(),
            updated.case_sensitivity(),
            "an update must keep the case sensitivity of the hierarchy"
        );
        if !current.ptr_eq(&updated) {
            self.root.store(Arc::new(updated));
        }
    }
}

impl std::fmt::Debug for AtomicSnapshotHierarchyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicSnapshotHierarchyReference")
            .field("root", &**self.root.load())
            .field("has_publisher", &self.publisher.is_some())
            .finish()
    }
}
