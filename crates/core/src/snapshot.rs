//! Immutable snapshots of file system locations
//!
//! A [`FileSystemLocationSnapshot`] is complete: it carries a content hash
//! and, for directories, every child. A [`MetadataSnapshot`] may also be a
//! partial marker that only knows the type of a location.

use crate::error::SnapshotError;
use crate::hash::{
    broken_link_signature, dir_signature, missing_file_signature, unreadable_signature, HashCode,
    IncrementalHasher,
};
use crate::path::{self, compare_file_names, compare_paths, CaseSensitivity};
use crate::stat::{AccessType, FileMetadata, FileType};
use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Snapshot of a regular file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularFileSnapshot {
    absolute_path: Arc<str>,
    name: Arc<str>,
    hash: HashCode,
    metadata: FileMetadata,
}

impl RegularFileSnapshot {
    pub fn new(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        hash: HashCode,
        metadata: FileMetadata,
    ) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            name: name.into(),
            hash,
            metadata,
        }
    }

    pub fn hash(&self) -> HashCode {
        self.hash
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }
}

/// Snapshot of a directory and all of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    absolute_path: Arc<str>,
    name: Arc<str>,
    access_type: AccessType,
    hash: HashCode,
    children: Vec<FileSystemLocationSnapshot>,
}

impl DirectorySnapshot {
    /// Build a directory snapshot from children already ordered by
    /// [`compare_file_names`].
    pub fn new(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
        children: Vec<FileSystemLocationSnapshot>,
    ) -> Self {
        debug_assert!(
            children
                .windows(2)
                .all(|pair| compare_file_names(pair[0].name(), pair[1].name()) == Ordering::Less),
            "directory children must be sorted by name"
        );
        let hash = Self::compute_hash(&children);
        Self {
            absolute_path: absolute_path.into(),
            name: name.into(),
            access_type,
            hash,
            children,
        }
    }

    /// Build a directory snapshot from children in arbitrary order
    pub fn from_unsorted(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
        mut children: Vec<FileSystemLocationSnapshot>,
    ) -> Self {
        children.sort_by(|a, b| compare_file_names(a.name(), b.name()));
        Self::new(absolute_path, name, access_type, children)
    }

    /// Merkle hash over the sorted `(name, hash)` pairs of the children
    pub fn compute_hash(children: &[FileSystemLocationSnapshot]) -> HashCode {
        let mut hasher = IncrementalHasher::new();
        hasher.put_hash(&dir_signature());
        for child in children {
            hasher.put_string(child.name());
            hasher.put_hash(&child.hash());
        }
        hasher.finalize()
    }

    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> HashCode {
        self.hash
    }

    pub fn children(&self) -> &[FileSystemLocationSnapshot] {
        &self.children
    }

    /// Find a direct child by name
    pub fn child(
        &self,
        name: &str,
        case_sensitivity: CaseSensitivity,
    ) -> Option<&FileSystemLocationSnapshot> {
        let found = match case_sensitivity {
            CaseSensitivity::CaseSensitive => self
                .children
                .binary_search_by(|child| compare_file_names(child.name(), name)),
            CaseSensitivity::CaseInsensitive => self.children.binary_search_by(|child| {
                compare_paths(child.name(), name, CaseSensitivity::CaseInsensitive)
            }),
        };
        found.ok().map(|index| &self.children[index])
    }
}

/// A location known not to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFileSnapshot {
    absolute_path: Arc<str>,
    name: Arc<str>,
    access_type: AccessType,
}

impl MissingFileSnapshot {
    pub fn new(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
    ) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            name: name.into(),
            access_type,
        }
    }
}

/// A symbolic link pointing at nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLinkSnapshot {
    absolute_path: Arc<str>,
    name: Arc<str>,
}

impl BrokenLinkSnapshot {
    pub fn new(absolute_path: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            name: name.into(),
        }
    }
}

/// A location that could not be read
///
/// Holds the error until someone asks for the type or content.
#[derive(Debug, Clone)]
pub struct UnreadableSnapshot {
    absolute_path: Arc<str>,
    name: Arc<str>,
    access_type: AccessType,
    error: SnapshotError,
}

impl UnreadableSnapshot {
    pub fn new(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
        error: io::Error,
    ) -> Self {
        let absolute_path = absolute_path.into();
        let error = SnapshotError::unreadable(&*absolute_path, error);
        Self {
            absolute_path,
            name: name.into(),
            access_type,
            error,
        }
    }

    pub fn error(&self) -> &SnapshotError {
        &self.error
    }
}

impl PartialEq for UnreadableSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.absolute_path == other.absolute_path
            && self.name == other.name
            && self.access_type == other.access_type
    }
}

impl Eq for UnreadableSnapshot {}

/// Discriminant of a complete snapshot that never fails to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    RegularFile,
    Directory,
    Missing,
    BrokenLink,
    Unreadable,
}

/// Complete snapshot of a file system location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemLocationSnapshot {
    RegularFile(Arc<RegularFileSnapshot>),
    Directory(Arc<DirectorySnapshot>),
    Missing(Arc<MissingFileSnapshot>),
    BrokenLink(Arc<BrokenLinkSnapshot>),
    Unreadable(Arc<UnreadableSnapshot>),
}

impl FileSystemLocationSnapshot {
    pub fn regular_file(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        hash: HashCode,
        metadata: FileMetadata,
    ) -> Self {
        Self::RegularFile(Arc::new(RegularFileSnapshot::new(
            absolute_path,
            name,
            hash,
            metadata,
        )))
    }

    pub fn directory(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
        children: Vec<FileSystemLocationSnapshot>,
    ) -> Self {
        Self::Directory(Arc::new(DirectorySnapshot::from_unsorted(
            absolute_path,
            name,
            access_type,
            children,
        )))
    }

    pub fn missing(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
    ) -> Self {
        Self::Missing(Arc::new(MissingFileSnapshot::new(
            absolute_path,
            name,
            access_type,
        )))
    }

    /// Missing snapshot named after the last segment of `absolute_path`
    pub fn missing_at(absolute_path: &str) -> Self {
        Self::missing(absolute_path, path::file_name(absolute_path), AccessType::Direct)
    }

    pub fn broken_link(absolute_path: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self::BrokenLink(Arc::new(BrokenLinkSnapshot::new(absolute_path, name)))
    }

    pub fn unreadable(
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        access_type: AccessType,
        error: io::Error,
    ) -> Self {
        Self::Unreadable(Arc::new(UnreadableSnapshot::new(
            absolute_path,
            name,
            access_type,
            error,
        )))
    }

    pub fn absolute_path(&self) -> &str {
        match self {
            Self::RegularFile(s) => &s.absolute_path,
            Self::Directory(s) => &s.absolute_path,
            Self::Missing(s) => &s.absolute_path,
            Self::BrokenLink(s) => &s.absolute_path,
            Self::Unreadable(s) => &s.absolute_path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::RegularFile(s) => &s.name,
            Self::Directory(s) => &s.name,
            Self::Missing(s) => &s.name,
            Self::BrokenLink(s) => &s.name,
            Self::Unreadable(s) => &s.name,
        }
    }

    pub fn hash(&self) -> HashCode {
        match self {
            Self::RegularFile(s) => s.hash,
            Self::Directory(s) => s.hash,
            Self::Missing(_) => missing_file_signature(),
            Self::BrokenLink(_) => broken_link_signature(),
            Self::Unreadable(_) => unreadable_signature(),
        }
    }

    pub fn access_type(&self) -> AccessType {
        match self {
            Self::RegularFile(s) => s.metadata.access_type,
            Self::Directory(s) => s.access_type,
            Self::Missing(s) => s.access_type,
            Self::BrokenLink(_) => AccessType::ViaSymlink,
            Self::Unreadable(s) => s.access_type,
        }
    }

    pub fn kind(&self) -> SnapshotKind {
        match self {
            Self::RegularFile(_) => SnapshotKind::RegularFile,
            Self::Directory(_) => SnapshotKind::Directory,
            Self::Missing(_) => SnapshotKind::Missing,
            Self::BrokenLink(_) => SnapshotKind::BrokenLink,
            Self::Unreadable(_) => SnapshotKind::Unreadable,
        }
    }

    /// Type of the location
    ///
    /// Fails for unreadable locations with the error captured when they were
    /// snapshotted.
    pub fn file_type(&self) -> Result<FileType, SnapshotError> {
        match self {
            Self::RegularFile(_) => Ok(FileType::RegularFile),
            Self::Directory(_) => Ok(FileType::Directory),
            Self::Missing(_) | Self::BrokenLink(_) => Ok(FileType::Missing),
            Self::Unreadable(s) => Err(s.error.clone()),
        }
    }

    pub fn as_directory(&self) -> Option<&DirectorySnapshot> {
        match self {
            Self::Directory(directory) => Some(directory),
            _ => None,
        }
    }

    /// Same location, same content and same access type
    pub fn is_content_and_metadata_up_to_date(&self, other: &FileSystemLocationSnapshot) -> bool {
        if self.kind() != other.kind() || self.access_type() != other.access_type() {
            return false;
        }
        match (self, other) {
            (Self::RegularFile(a), Self::RegularFile(b)) => {
                a.hash == b.hash && a.metadata.is_content_up_to_date(&b.metadata)
            }
            _ => self.hash() == other.hash(),
        }
    }

    /// Whether `other` describes exactly the same location and state
    pub fn same_as(&self, other: &FileSystemLocationSnapshot) -> bool {
        self.absolute_path() == other.absolute_path()
            && self.name() == other.name()
            && self.is_content_and_metadata_up_to_date(other)
    }

    /// Re-root this snapshot at another path, e.g. the symbolic link through
    /// which it was reached. Content hashes are unchanged.
    pub fn relocated(&self, absolute_path: &str, name: &str, access_type: AccessType) -> Self {
        match self {
            Self::RegularFile(s) => {
                let metadata = FileMetadata {
                    access_type,
                    ..s.metadata
                };
                Self::regular_file(absolute_path, name, s.hash, metadata)
            }
            Self::Directory(s) => {
                let children = s
                    .children
                    .iter()
                    .map(|child| {
                        let separator = std::path::MAIN_SEPARATOR;
                        let child_path = format!("{}{}{}", absolute_path, separator, child.name());
                        child.relocated(&child_path, child.name(), child.access_type())
                    })
                    .collect();
                Self::Directory(Arc::new(DirectorySnapshot {
                    absolute_path: absolute_path.into(),
                    name: name.into(),
                    access_type,
                    hash: s.hash,
                    children,
                }))
            }
            Self::Missing(_) => Self::missing(absolute_path, name, access_type),
            Self::BrokenLink(_) => Self::broken_link(absolute_path, name),
            Self::Unreadable(s) => Self::Unreadable(Arc::new(UnreadableSnapshot {
                absolute_path: absolute_path.into(),
                name: name.into(),
                access_type,
                error: s.error.clone(),
            })),
        }
    }

    /// Walk this snapshot depth-first
    pub fn accept<V: SnapshotHierarchyVisitor + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> SnapshotVisitResult {
        self.accept_at(visitor, 0)
    }

    fn accept_at<V: SnapshotHierarchyVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        depth: usize,
    ) -> SnapshotVisitResult {
        let result = visitor.visit_entry(self, depth);
        if result != SnapshotVisitResult::Continue {
            return result;
        }
        if let Self::Directory(directory) = self {
            visitor.enter_directory(directory, depth);
            for child in &directory.children {
                if child.accept_at(visitor, depth + 1) == SnapshotVisitResult::Terminate {
                    return SnapshotVisitResult::Terminate;
                }
            }
            visitor.leave_directory(directory, depth);
        }
        SnapshotVisitResult::Continue
    }
}

impl fmt::Display for FileSystemLocationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            SnapshotKind::RegularFile => "file",
            SnapshotKind::Directory => "dir",
            SnapshotKind::Missing => "missing",
            SnapshotKind::BrokenLink => "broken-link",
            SnapshotKind::Unreadable => "unreadable",
        };
        write!(f, "{} {} {}", kind, self.absolute_path(), self.hash())
    }
}

/// Result of visiting one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotVisitResult {
    Continue,
    SkipSubtree,
    Terminate,
}

/// Depth-first visitor over a snapshot tree
pub trait SnapshotHierarchyVisitor {
    fn visit_entry(
        &mut self,
        snapshot: &FileSystemLocationSnapshot,
        depth: usize,
    ) -> SnapshotVisitResult;

    fn enter_directory(&mut self, _directory: &DirectorySnapshot, _depth: usize) {}

    fn leave_directory(&mut self, _directory: &DirectorySnapshot, _depth: usize) {}
}

impl<F> SnapshotHierarchyVisitor for F
where
    F: FnMut(&FileSystemLocationSnapshot, usize) -> SnapshotVisitResult,
{
    fn visit_entry(
        &mut self,
        snapshot: &FileSystemLocationSnapshot,
        depth: usize,
    ) -> SnapshotVisitResult {
        self(snapshot, depth)
    }
}

/// Anything that can be stored in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSnapshot {
    /// Fully known location
    Complete(FileSystemLocationSnapshot),
    /// Known to be a directory, contents not fully explored
    Directory(AccessType),
    /// Known to be a regular file, content not hashed yet
    RegularFile(FileMetadata),
}

impl MetadataSnapshot {
    pub fn file_type(&self) -> Result<FileType, SnapshotError> {
        match self {
            Self::Complete(snapshot) => snapshot.file_type(),
            Self::Directory(_) => Ok(FileType::Directory),
            Self::RegularFile(_) => Ok(FileType::RegularFile),
        }
    }

    pub fn access_type(&self) -> AccessType {
        match self {
            Self::Complete(snapshot) => snapshot.access_type(),
            Self::Directory(access_type) => *access_type,
            Self::RegularFile(metadata) => metadata.access_type,
        }
    }

    pub fn as_complete(&self) -> Option<&FileSystemLocationSnapshot> {
        match self {
            Self::Complete(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

impl From<FileSystemLocationSnapshot> for MetadataSnapshot {
    fn from(snapshot: FileSystemLocationSnapshot) -> Self {
        Self::Complete(snapshot)
    }
}
