//! Trie nodes of the snapshot hierarchy
//!
//! Nodes are immutable. Store and invalidate rebuild only the nodes on the
//! path from the touched location up to the root and share everything else.

use crate::child_map::{ChildMap, Entry, FoundChild};
use crate::diff::{AddedOnly, NodeDiffListener};
use std::cmp::Ordering;
use std::sync::Arc;
use vfs_core::path::{compare_first_segments, CaseSensitivity, PathRelationship, RelativePath};
use vfs_core::{AccessType, FileMetadata, FileSystemLocationSnapshot, FileType, MetadataSnapshot};

pub type NodeRef = Arc<FileSystemNode>;

/// A node of the path-compressed trie
///
/// The key leading to a node is held by the parent's [`ChildMap`].
#[derive(Debug, Clone)]
pub enum FileSystemNode {
    /// Fully known location, including every descendant
    Complete(FileSystemLocationSnapshot),
    /// Regular file whose content has not been hashed
    RegularFileMetadata(FileMetadata),
    /// Directory with some of its children known
    PartialDirectory {
        access_type: AccessType,
        children: ChildMap<NodeRef>,
    },
    /// Split point of unknown type
    Unknown { children: ChildMap<NodeRef> },
}

/// Outcome of invalidating below a node
#[derive(Debug)]
pub(crate) enum Invalidation {
    Unchanged,
    Removed,
    Replaced(NodeRef),
}

impl FileSystemNode {
    pub fn empty() -> Self {
        Self::Unknown {
            children: ChildMap::new(),
        }
    }

    pub fn from_metadata(snapshot: &MetadataSnapshot) -> Self {
        match snapshot {
            MetadataSnapshot::Complete(snapshot) => Self::Complete(snapshot.clone()),
            MetadataSnapshot::Directory(access_type) => Self::PartialDirectory {
                access_type: *access_type,
                children: ChildMap::new(),
            },
            MetadataSnapshot::RegularFile(metadata) => Self::RegularFileMetadata(*metadata),
        }
    }

    /// What this node knows about its own location
    pub fn metadata(&self) -> Option<MetadataSnapshot> {
        match self {
            Self::Complete(snapshot) => Some(MetadataSnapshot::Complete(snapshot.clone())),
            Self::RegularFileMetadata(metadata) => Some(MetadataSnapshot::RegularFile(*metadata)),
            Self::PartialDirectory { access_type, .. } => {
                Some(MetadataSnapshot::Directory(*access_type))
            }
            Self::Unknown { .. } => None,
        }
    }

    pub fn snapshot(&self) -> Option<&FileSystemLocationSnapshot> {
        match self {
            Self::Complete(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&ChildMap<NodeRef>> {
        match self {
            Self::PartialDirectory { children, .. } | Self::Unknown { children } => Some(children),
            _ => None,
        }
    }

    /// Whether anything is known at or below this node
    pub fn has_descendants(&self) -> bool {
        match self {
            Self::Unknown { children } => !children.is_empty(),
            _ => true,
        }
    }

    /// Whether the location is known to exist
    fn denotes_existing_location(&self) -> bool {
        match self {
            Self::Complete(snapshot) => matches!(
                snapshot.file_type(),
                Ok(FileType::RegularFile | FileType::Directory)
            ),
            Self::RegularFileMetadata(_) | Self::PartialDirectory { .. } => true,
            Self::Unknown { .. } => false,
        }
    }

    /// Node holding `children` whose own type is only implied by them
    fn parent_of(children: ChildMap<NodeRef>) -> Self {
        if children.values().any(|child| child.denotes_existing_location()) {
            Self::PartialDirectory {
                access_type: AccessType::Direct,
                children,
            }
        } else {
            Self::Unknown { children }
        }
    }

    /// Visit the topmost complete snapshots at or below this node
    pub fn visit_root_snapshots(&self, visitor: &mut dyn FnMut(&FileSystemLocationSnapshot)) {
        match self {
            Self::Complete(snapshot) => visitor(snapshot),
            Self::RegularFileMetadata(_) => {}
            Self::PartialDirectory { children, .. } | Self::Unknown { children } => {
                for child in children.values() {
                    child.visit_root_snapshots(visitor);
                }
            }
        }
    }

    pub fn get_metadata(
        &self,
        path: RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
    ) -> Option<MetadataSnapshot> {
        if path.is_empty() {
            return self.metadata();
        }
        match self {
            Self::Complete(snapshot) => find_in_snapshot(snapshot, path, case_sensitivity),
            Self::RegularFileMetadata(_) => Some(missing_at(&path)),
            Self::PartialDirectory { children, .. } | Self::Unknown { children } => {
                let found = children.find_child(&path, case_sensitivity)?;
                match found.relationship {
                    PathRelationship::Exact => found.value.metadata(),
                    PathRelationship::Descendant { path_offset } => found
                        .value
                        .get_metadata(path.suffix_starting_from(path_offset), case_sensitivity),
                    _ => None,
                }
            }
        }
    }

    pub fn has_descendants_under(
        &self,
        path: RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
    ) -> bool {
        if path.is_empty() {
            return self.has_descendants();
        }
        match self {
            Self::Complete(_) => true,
            Self::RegularFileMetadata(_) => false,
            Self::PartialDirectory { children, .. } | Self::Unknown { children } => {
                let Some(found) = children.find_child(&path, case_sensitivity) else {
                    return false;
                };
                match found.relationship {
                    PathRelationship::Exact => found.value.has_descendants(),
                    PathRelationship::Descendant { path_offset } => {
                        found.value.has_descendants_under(
                            path.suffix_starting_from(path_offset),
                            case_sensitivity,
                        )
                    }
                    PathRelationship::Ancestor { .. } => true,
                    PathRelationship::Sibling { .. } | PathRelationship::Unrelated => false,
                }
            }
        }
    }

    /// Visit the topmost complete snapshots at or below `path`
    pub fn visit_root_snapshots_under(
        &self,
        path: RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
        visitor: &mut dyn FnMut(&FileSystemLocationSnapshot),
    ) {
        if path.is_empty() {
            self.visit_root_snapshots(visitor);
            return;
        }
        match self {
            Self::Complete(snapshot) => {
                if let Some(MetadataSnapshot::Complete(found)) =
                    find_in_snapshot(snapshot, path, case_sensitivity)
                {
                    if !matches!(found, FileSystemLocationSnapshot::Missing(_)) {
                        visitor(&found);
                    }
                }
            }
            Self::RegularFileMetadata(_) => {}
            Self::PartialDirectory { children, .. } | Self::Unknown { children } => {
                let Some(found) = children.find_child(&path, case_sensitivity) else {
                    return;
                };
                match found.relationship {
                    PathRelationship::Exact | PathRelationship::Ancestor { .. } => {
                        found.value.visit_root_snapshots(visitor)
                    }
                    PathRelationship::Descendant { path_offset } => {
                        found.value.visit_root_snapshots_under(
                            path.suffix_starting_from(path_offset),
                            case_sensitivity,
                            visitor,
                        )
                    }
                    PathRelationship::Sibling { .. } | PathRelationship::Unrelated => {}
                }
            }
        }
    }

    /// Store `snapshot` at `path` relative to this node
    pub(crate) fn store(
        self: &Arc<Self>,
        path: RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
        snapshot: &MetadataSnapshot,
        listener: &mut dyn NodeDiffListener,
    ) -> NodeRef {
        if path.is_empty() {
            return self.merge(snapshot, listener);
        }
        match &**self {
            // a complete snapshot already describes everything below it
            Self::Complete(_) => Arc::clone(self),
            Self::RegularFileMetadata(_) => {
                let child = Arc::new(Self::from_metadata(snapshot));
                listener.node_removed(self);
                listener.node_added(&child);
                Arc::new(Self::parent_of(ChildMap::singleton(path.as_str(), child)))
            }
            Self::PartialDirectory {
                access_type,
                children,
            } => match store_in_children(children, path, case_sensitivity, snapshot, listener) {
                Some(children) => Arc::new(Self::PartialDirectory {
                    access_type: *access_type,
                    children,
                }),
                None => Arc::clone(self),
            },
            Self::Unknown { children } => {
                match store_in_children(children, path, case_sensitivity, snapshot, listener) {
                    Some(children) => Arc::new(Self::Unknown { children }),
                    None => Arc::clone(self),
                }
            }
        }
    }

    /// Combine this node with a snapshot stored at exactly its location
    ///
    /// Complete snapshots replace whatever is there. Partial metadata never
    /// replaces a complete snapshot or a partial directory.
    fn merge(
        self: &Arc<Self>,
        snapshot: &MetadataSnapshot,
        listener: &mut dyn NodeDiffListener,
    ) -> NodeRef {
        match (&**self, snapshot) {
            (Self::Complete(existing), MetadataSnapshot::Complete(new))
                if existing.same_as(new) =>
            {
                return Arc::clone(self);
            }
            (_, MetadataSnapshot::Complete(_)) => {}
            (Self::Complete(_), _) => return Arc::clone(self),
            (Self::PartialDirectory { .. }, MetadataSnapshot::Directory(_)) => {
                return Arc::clone(self)
            }
            (Self::Unknown { children }, MetadataSnapshot::Directory(access_type)) => {
                return Arc::new(Self::PartialDirectory {
                    access_type: *access_type,
                    children: children.clone(),
                });
            }
            (Self::RegularFileMetadata(existing), MetadataSnapshot::RegularFile(new))
                if existing == new =>
            {
                return Arc::clone(self);
            }
            _ => {}
        }

        let node = Arc::new(Self::from_metadata(snapshot));
        listener.node_removed(self);
        listener.node_added(&node);
        node
    }

    /// Forget everything known at and below `path` relative to this node
    ///
    /// `path` must not be empty. A complete directory loses completeness and
    /// turns into a partial directory of its remaining children.
    pub(crate) fn invalidate(
        self: &Arc<Self>,
        path: RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
        listener: &mut dyn NodeDiffListener,
    ) -> Invalidation {
        match &**self {
            Self::Complete(snapshot @ FileSystemLocationSnapshot::Directory(directory)) => {
                listener.node_removed(self);
                let name = path.first_segment();
                let rest = path.from_child(name);

                let mut entries = Vec::with_capacity(directory.children().len());
                let mut previous: Option<&str> = None;
                for child in directory.children() {
                    // children equal under the case sensitivity are adjacent; keep the first
                    if previous.map_or(false, |kept| {
                        compare_first_segments(kept, child.name(), case_sensitivity)
                            == Ordering::Equal
                    }) {
                        continue;
                    }
                    previous = Some(child.name());
                    let node = Arc::new(Self::Complete(child.clone()));
                    if compare_first_segments(child.name(), name, case_sensitivity)
                        != Ordering::Equal
                    {
                        listener.node_added(&node);
                        entries.push(Entry::new(child.name(), node));
                        continue;
                    }
                    if rest.is_empty() {
                        continue;
                    }
                    match node.invalidate(rest, case_sensitivity, &mut AddedOnly(&mut *listener)) {
                        Invalidation::Removed => {}
                        Invalidation::Unchanged => {
                            listener.node_added(&node);
                            entries.push(Entry::new(child.name(), node));
                        }
                        Invalidation::Replaced(replacement) => {
                            entries.push(Entry::new(child.name(), replacement))
                        }
                    }
                }

                Invalidation::Replaced(Arc::new(Self::PartialDirectory {
                    access_type: snapshot.access_type(),
                    children: ChildMap::from_entries(entries, case_sensitivity),
                }))
            }
            Self::Complete(_) | Self::RegularFileMetadata(_) => {
                listener.node_removed(self);
                Invalidation::Removed
            }
            Self::PartialDirectory {
                access_type,
                children,
            } => match invalidate_in_children(children, path, case_sensitivity, listener) {
                // a known directory stays known, even without children
                Some(children) => Invalidation::Replaced(Arc::new(Self::PartialDirectory {
                    access_type: *access_type,
                    children,
                })),
                None => Invalidation::Unchanged,
            },
            Self::Unknown { children } => {
                match invalidate_in_children(children, path, case_sensitivity, listener) {
                    Some(children) if children.is_empty() => Invalidation::Removed,
                    Some(children) => Invalidation::Replaced(Arc::new(Self::Unknown { children })),
                    None => Invalidation::Unchanged,
                }
            }
        }
    }
}

fn missing_at(path: &RelativePath<'_>) -> MetadataSnapshot {
    MetadataSnapshot::Complete(FileSystemLocationSnapshot::missing_at(path.absolute_path()))
}

/// Descend into a complete snapshot
///
/// Names a complete directory does not contain, and anything below a file or
/// a missing location, are known to be missing. Nothing is known below an
/// unreadable location.
fn find_in_snapshot(
    snapshot: &FileSystemLocationSnapshot,
    path: RelativePath<'_>,
    case_sensitivity: CaseSensitivity,
) -> Option<MetadataSnapshot> {
    let mut current = snapshot;
    let mut remaining = path;
    while !remaining.is_empty() {
        match current {
            FileSystemLocationSnapshot::Directory(directory) => {
                let name = remaining.first_segment();
                match directory.child(name, case_sensitivity) {
                    Some(child) => {
                        current = child;
                        remaining = remaining.from_child(name);
                    }
                    None => return Some(missing_at(&path)),
                }
            }
            FileSystemLocationSnapshot::Unreadable(_) => return None,
            _ => return Some(missing_at(&path)),
        }
    }
    Some(MetadataSnapshot::Complete(current.clone()))
}

fn replace_if_changed(
    children: &ChildMap<NodeRef>,
    found: &FoundChild<'_, NodeRef>,
    updated: NodeRef,
) -> Option<ChildMap<NodeRef>> {
    if Arc::ptr_eq(found.value, &updated) {
        None
    } else {
        Some(children.replace_child(found.index, Arc::clone(found.key), updated))
    }
}

/// Returns `None` when the children are unchanged
fn store_in_children(
    children: &ChildMap<NodeRef>,
    path: RelativePath<'_>,
    case_sensitivity: CaseSensitivity,
    snapshot: &MetadataSnapshot,
    listener: &mut dyn NodeDiffListener,
) -> Option<ChildMap<NodeRef>> {
    let Some(found) = children.find_child(&path, case_sensitivity) else {
        let child = Arc::new(FileSystemNode::from_metadata(snapshot));
        listener.node_added(&child);
        return Some(children.insert_child(path.as_str(), child, case_sensitivity));
    };

    match found.relationship {
        PathRelationship::Exact => {
            let merged = found.value.merge(snapshot, listener);
            replace_if_changed(children, &found, merged)
        }
        PathRelationship::Descendant { path_offset } => {
            let updated = found.value.store(
                path.suffix_starting_from(path_offset),
                case_sensitivity,
                snapshot,
                listener,
            );
            replace_if_changed(children, &found, updated)
        }
        PathRelationship::Ancestor { key_offset } => {
            let key: &str = found.key;
            let replacement = match snapshot {
                MetadataSnapshot::Directory(access_type) => {
                    Arc::new(FileSystemNode::PartialDirectory {
                        access_type: *access_type,
                        children: ChildMap::singleton(&key[key_offset..], Arc::clone(found.value)),
                    })
                }
                _ => {
                    let node = Arc::new(FileSystemNode::from_metadata(snapshot));
                    listener.node_removed(found.value);
                    listener.node_added(&node);
                    node
                }
            };
            Some(children.replace_child(found.index, path.as_str(), replacement))
        }
        PathRelationship::Sibling {
            key_prefix_len,
            path_prefix_len,
        } => {
            let key: &str = found.key;
            let new_child = Arc::new(FileSystemNode::from_metadata(snapshot));
            listener.node_added(&new_child);

            let split_children = ChildMap::from_entries(
                vec![
                    Entry::new(&key[key_prefix_len + 1..], Arc::clone(found.value)),
                    Entry::new(&path.as_str()[path_prefix_len + 1..], new_child),
                ],
                case_sensitivity,
            );
            let split = Arc::new(FileSystemNode::parent_of(split_children));
            Some(children.replace_child(found.index, &key[..key_prefix_len], split))
        }
        PathRelationship::Unrelated => unreachable!("find_child never reports unrelated children"),
    }
}

/// Returns `None` when the children are unchanged
fn invalidate_in_children(
    children: &ChildMap<NodeRef>,
    path: RelativePath<'_>,
    case_sensitivity: CaseSensitivity,
    listener: &mut dyn NodeDiffListener,
) -> Option<ChildMap<NodeRef>> {
    let found = children.find_child(&path, case_sensitivity)?;
    match found.relationship {
        PathRelationship::Exact | PathRelationship::Ancestor { .. } => {
            listener.node_removed(found.value);
            Some(children.remove_child(found.index))
        }
        PathRelationship::Descendant { path_offset } => {
            match found.value.invalidate(
                path.suffix_starting_from(path_offset),
                case_sensitivity,
                listener,
            ) {
                Invalidation::Unchanged => None,
                Invalidation::Removed => Some(children.remove_child(found.index)),
                Invalidation::Replaced(node) => {
                    // fold a split point with a single child back into the edge
                    if let FileSystemNode::Unknown {
                        children: ChildMap::Singleton(entry),
                    } = &*node
                    {
                        let key =
                            format!("{}{}{}", found.key, std::path::MAIN_SEPARATOR, entry.key());
                        let value = Arc::clone(entry.value());
                        return Some(children.replace_child(found.index, key, value));
                    }
                    Some(children.replace_child(found.index, Arc::clone(found.key), node))
                }
            }
        }
        PathRelationship::Sibling { .. } | PathRelationship::Unrelated => None,
    }
}
