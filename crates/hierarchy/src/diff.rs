//! Change notification for hierarchy updates

use crate::node::FileSystemNode;
use vfs_core::FileSystemLocationSnapshot;

/// Receives the topmost nodes added to or removed from a hierarchy by one
/// update
///
/// Nodes below a reported node are not reported separately.
pub trait NodeDiffListener {
    fn node_removed(&mut self, node: &FileSystemNode);

    fn node_added(&mut self, node: &FileSystemNode);
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiffListener;

impl NodeDiffListener for NoopDiffListener {
    fn node_removed(&mut self, _node: &FileSystemNode) {}

    fn node_added(&mut self, _node: &FileSystemNode) {}
}

/// Forwards additions only
///
/// Used while rewriting the inside of a node whose removal was already
/// reported.
pub(crate) struct AddedOnly<'a>(pub(crate) &'a mut dyn NodeDiffListener);

impl NodeDiffListener for AddedOnly<'_> {
    fn node_removed(&mut self, _node: &FileSystemNode) {}

    fn node_added(&mut self, node: &FileSystemNode) {
        self.0.node_added(node);
    }
}

/// Receives the complete snapshots that left and entered a hierarchy
pub trait SnapshotDiffPublisher: Send + Sync {
    fn publish(
        &self,
        removed: &[FileSystemLocationSnapshot],
        added: &[FileSystemLocationSnapshot],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Collects the root snapshots of every reported node
#[derive(Debug, Default)]
pub struct SnapshotCollectingDiffListener {
    removed: Vec<FileSystemLocationSnapshot>,
    added: Vec<FileSystemLocationSnapshot>,
}

impl SnapshotCollectingDiffListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn removed(&self) -> &[FileSystemLocationSnapshot] {
        &self.removed
    }

    pub fn added(&self) -> &[FileSystemLocationSnapshot] {
        &self.added
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Hand the collected snapshots to `publisher`, skipping empty diffs
    pub fn publish_snapshot_diff(
        &self,
        publisher: &dyn SnapshotDiffPublisher,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.is_empty() {
            return Ok(());
        }
        publisher.publish(&self.removed, &self.added)
    }
}

impl NodeDiffListener for SnapshotCollectingDiffListener {
    fn node_removed(&mut self, node: &FileSystemNode) {
        node.visit_root_snapshots(&mut |snapshot| self.removed.push(snapshot.clone()));
    }

    fn node_added(&mut self, node: &FileSystemNode) {
        node.visit_root_snapshots(&mut |snapshot| self.added.push(snapshot.clone()));
    }
}
