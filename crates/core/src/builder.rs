//! Depth-first Merkle builder for directory snapshots
//!
//! A walker enters directories, visits leaves and leaves directories again.
//! Leaving a directory hashes the children collected for it and hands the
//! resulting snapshot to the enclosing level, or keeps it as the result when
//! the outermost directory is left.

use crate::error::SnapshotError;
use crate::snapshot::{DirectorySnapshot, FileSystemLocationSnapshot};
use crate::stat::AccessType;
use std::sync::Arc;

/// What to do with a directory that ends up without children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDirectoryHandling {
    IncludeEmptyDirs,
    /// Leave the directory out of its parent entirely
    ExcludeEmptyDirs,
}

#[derive(Debug)]
struct Level {
    absolute_path: Arc<str>,
    name: Arc<str>,
    access_type: AccessType,
    empty_directory_handling: EmptyDirectoryHandling,
    children: Vec<FileSystemLocationSnapshot>,
    filtered: bool,
}

/// Builds a [`DirectorySnapshot`] tree from a depth-first walk
#[derive(Debug)]
pub struct MerkleDirectorySnapshotBuilder {
    levels: Vec<Level>,
    result: Option<FileSystemLocationSnapshot>,
    sorting_required: bool,
}

impl MerkleDirectorySnapshotBuilder {
    /// Builder for walkers that report entries in arbitrary order
    pub fn sorting_required() -> Self {
        Self {
            levels: Vec::new(),
            result: None,
            sorting_required: true,
        }
    }

    /// Builder for walkers that already report entries ordered by
    /// [`compare_file_names`](crate::path::compare_file_names)
    pub fn no_sorting_required() -> Self {
        Self {
            levels: Vec::new(),
            result: None,
            sorting_required: false,
        }
    }

    pub fn enter_directory(
        &mut self,
        access_type: AccessType,
        absolute_path: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        empty_directory_handling: EmptyDirectoryHandling,
    ) {
        self.levels.push(Level {
            absolute_path: absolute_path.into(),
            name: name.into(),
            access_type,
            empty_directory_handling,
            children: Vec::new(),
            filtered: false,
        });
    }

    /// Add a file, missing, broken-link or unreadable entry
    pub fn visit_leaf_element(&mut self, snapshot: FileSystemLocationSnapshot) {
        self.collect(snapshot);
    }

    /// Add a directory that was snapshotted separately
    pub fn visit_directory(&mut self, snapshot: FileSystemLocationSnapshot) {
        self.collect(snapshot);
    }

    /// Finish the current directory
    ///
    /// Returns the directory snapshot, or `None` when it was empty and
    /// excluded.
    pub fn leave_directory(&mut self) -> Result<Option<FileSystemLocationSnapshot>, SnapshotError> {
        let level = self.levels.pop().ok_or(SnapshotError::NoOpenDirectory)?;
        if level.filtered {
            self.mark_current_level_as_filtered();
        }

        if level.children.is_empty()
            && level.empty_directory_handling == EmptyDirectoryHandling::ExcludeEmptyDirs
        {
            return Ok(None);
        }

        let directory = if self.sorting_required {
            DirectorySnapshot::from_unsorted(
                level.absolute_path,
                level.name,
                level.access_type,
                level.children,
            )
        } else {
            DirectorySnapshot::new(
                level.absolute_path,
                level.name,
                level.access_type,
                level.children,
            )
        };
        let snapshot = FileSystemLocationSnapshot::Directory(Arc::new(directory));
        self.collect(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Record that the current directory is missing entries on purpose
    ///
    /// The flag propagates to every enclosing directory when it is left.
    pub fn mark_current_level_as_filtered(&mut self) {
        if let Some(level) = self.levels.last_mut() {
            level.filtered = true;
        }
    }

    pub fn is_current_level_unfiltered(&self) -> bool {
        self.levels.last().map_or(true, |level| !level.filtered)
    }

    /// Depth of open directories
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn result(&self) -> Result<Option<&FileSystemLocationSnapshot>, SnapshotError> {
        if !self.levels.is_empty() {
            return Err(SnapshotError::UnbalancedBuilder(self.levels.len()));
        }
        Ok(self.result.as_ref())
    }

    pub fn into_result(self) -> Result<Option<FileSystemLocationSnapshot>, SnapshotError> {
        if !self.levels.is_empty() {
            return Err(SnapshotError::UnbalancedBuilder(self.levels.len()));
        }
        Ok(self.result)
    }

    fn collect(&mut self, snapshot: FileSystemLocationSnapshot) {
        match self.levels.last_mut() {
            Some(level) => level.children.push(snapshot),
            None => self.result = Some(snapshot),
        }
    }
}
