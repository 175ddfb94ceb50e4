//! Counters for walks and retained snapshots

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use vfs_core::{FileSystemLocationSnapshot, SnapshotKind, SnapshotVisitResult};
use vfs_hierarchy::SnapshotHierarchy;

/// Running totals across every walk of one snapshotter
#[derive(Debug, Default)]
pub struct WalkStatistics {
    visited_files: AtomicU64,
    visited_directories: AtomicU64,
    unreadable_entries: AtomicU64,
    skipped_cycles: AtomicU64,
}

impl WalkStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_file(&self) {
        self.visited_files.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_directory(&self) {
        self.visited_directories.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unreadable(&self) {
        self.unreadable_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cycle(&self) {
        self.skipped_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn visited_files(&self) -> u64 {
        self.visited_files.load(Ordering::Relaxed)
    }

    pub fn visited_directories(&self) -> u64 {
        self.visited_directories.load(Ordering::Relaxed)
    }

    pub fn unreadable_entries(&self) -> u64 {
        self.unreadable_entries.load(Ordering::Relaxed)
    }

    pub fn skipped_cycles(&self) -> u64 {
        self.skipped_cycles.load(Ordering::Relaxed)
    }
}

impl fmt::Display for WalkStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} directories visited ({} unreadable, {} symlink cycles skipped)",
            self.visited_files(),
            self.visited_directories(),
            self.unreadable_entries(),
            self.skipped_cycles()
        )
    }
}

/// Composition of the snapshots retained by a hierarchy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStatistics {
    pub roots: u64,
    pub regular_files: u64,
    pub directories: u64,
    pub missing: u64,
    pub broken_links: u64,
    pub unreadable: u64,
}

impl SnapshotStatistics {
    pub fn of(hierarchy: &SnapshotHierarchy) -> Self {
        let mut statistics = Self::default();
        hierarchy.visit_snapshot_roots(|root| {
            statistics.roots += 1;
            statistics.add(root);
        });
        statistics
    }

    /// Count every location in `snapshot` and below
    pub fn add(&mut self, snapshot: &FileSystemLocationSnapshot) {
        let mut count = |entry: &FileSystemLocationSnapshot, _depth: usize| {
            match entry.kind() {
                SnapshotKind::RegularFile => self.regular_files += 1,
                SnapshotKind::Directory => self.directories += 1,
                SnapshotKind::Missing => self.missing += 1,
                SnapshotKind::BrokenLink => self.broken_links += 1,
                SnapshotKind::Unreadable => self.unreadable += 1,
            }
            SnapshotVisitResult::Continue
        };
        snapshot.accept(&mut count);
    }

    pub fn total(&self) -> u64 {
        self.regular_files + self.directories + self.missing + self.broken_links + self.unreadable
    }
}

impl fmt::Display for SnapshotStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} roots: {} files, {} directories, {} missing, {} broken links, {} unreadable",
            self.roots,
            self.regular_files,
            self.directories,
            self.missing,
            self.broken_links,
            self.unreadable
        )
    }
}
