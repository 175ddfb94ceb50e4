//! Immutable snapshot hierarchy rooted at the file system root

use crate::diff::NodeDiffListener;
use crate::node::{FileSystemNode, Invalidation, NodeRef};
use std::sync::Arc;
use vfs_core::path::{CaseSensitivity, RelativePath};
use vfs_core::{FileSystemLocationSnapshot, MetadataSnapshot};

/// A persistent trie of snapshots
///
/// Updates return a new hierarchy and leave the receiver untouched; both
/// share every node the update did not rewrite. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SnapshotHierarchy {
    root: NodeRef,
    case_sensitivity: CaseSensitivity,
}

impl SnapshotHierarchy {
    pub fn new(case_sensitivity: CaseSensitivity) -> Self {
        Self {
            root: Arc::new(FileSystemNode::empty()),
            case_sensitivity,
        }
    }

    /// An empty hierarchy with the same case sensitivity
    pub fn empty(&self) -> Self {
        Self::new(self.case_sensitivity)
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    pub fn root_node(&self) -> &FileSystemNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        !self.root.has_descendants()
    }

    /// Whether both hierarchies share the same root node
    pub fn ptr_eq(&self, other: &SnapshotHierarchy) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    pub fn find_metadata(&self, absolute_path: &str) -> Option<MetadataSnapshot> {
        self.root
            .get_metadata(RelativePath::of(absolute_path), self.case_sensitivity)
    }

    /// The complete snapshot at `absolute_path`, if one is known
    pub fn find_snapshot(&self, absolute_path: &str) -> Option<FileSystemLocationSnapshot> {
        match self.find_metadata(absolute_path)? {
            MetadataSnapshot::Complete(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn has_descendants_under(&self, absolute_path: &str) -> bool {
        self.root
            .has_descendants_under(RelativePath::of(absolute_path), self.case_sensitivity)
    }

    /// The topmost complete snapshots in the hierarchy
    pub fn root_snapshots(&self) -> Vec<FileSystemLocationSnapshot> {
        let mut snapshots = Vec::new();
        self.visit_snapshot_roots(|snapshot| snapshots.push(snapshot.clone()));
        snapshots
    }

    pub fn visit_snapshot_roots(&self, mut visitor: impl FnMut(&FileSystemLocationSnapshot)) {
        self.root.visit_root_snapshots(&mut visitor);
    }

    /// The topmost complete snapshots at or below `absolute_path`
    pub fn root_snapshots_under(&self, absolute_path: &str) -> Vec<FileSystemLocationSnapshot> {
        let mut snapshots = Vec::new();
        self.root.visit_root_snapshots_under(
            RelativePath::of(absolute_path),
            self.case_sensitivity,
            &mut |snapshot| snapshots.push(snapshot.clone()),
        );
        snapshots
    }

    pub fn store(
        &self,
        absolute_path: &str,
        snapshot: impl Into<MetadataSnapshot>,
        listener: &mut dyn NodeDiffListener,
    ) -> Self {
        let snapshot = snapshot.into();
        let root = self.root.store(
            RelativePath::of(absolute_path),
            self.case_sensitivity,
            &snapshot,
            listener,
        );
        self.with_root(root)
    }

    pub fn invalidate(&self, absolute_path: &str, listener: &mut dyn NodeDiffListener) -> Self {
        let path = RelativePath::of(absolute_path);
        if path.is_empty() {
            if self.is_empty() {
                return self.clone();
            }
            listener.node_removed(&self.root);
            return self.empty();
        }

        match self.root.invalidate(path, self.case_sensitivity, listener) {
            Invalidation::Unchanged => self.clone(),
            Invalidation::Removed => self.empty(),
            Invalidation::Replaced(root) => self.with_root(root),
        }
    }

    fn with_root(&self, root: NodeRef) -> Self {
        Self {
            root,
            case_sensitivity: self.case_sensitivity,
        }
    }
}
