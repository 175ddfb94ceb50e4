//! Directory walker producing Merkle snapshots
//!
//! A walk visits the tree depth-first with [`walkdir`] and feeds every
//! entry into a [`MerkleDirectorySnapshotBuilder`]. Symbolic links are
//! followed: a link to a directory starts a nested walk of its canonical
//! target, with paths inside it reported below the link location.

use crate::error::{Result, SnapshotterError};
use crate::excludes::DefaultExcludes;
use crate::filter::SnapshottingFilter;
use crate::interner::StringInterner;
use crate::statistics::WalkStatistics;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use tracing::{debug, warn};
use vfs_core::path::{file_name, RelativePathTracker};
use vfs_core::{
    AccessType, DefaultFileHasher, DefaultStat, EmptyDirectoryHandling, FileHasher, FileMetadata,
    FileSystemLocationSnapshot, FileType, MerkleDirectorySnapshotBuilder, Stat, StatError,
};
use walkdir::WalkDir;

/// Result of a snapshot walk
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub snapshot: FileSystemLocationSnapshot,
    /// Whether the filter rejected anything below the root
    pub filtered: bool,
}

/// Snapshots directory trees
pub struct DirectorySnapshotter {
    hasher: Arc<dyn FileHasher>,
    stat: Arc<dyn Stat>,
    interner: Arc<StringInterner>,
    default_excludes: DefaultExcludes,
    empty_directory_handling: EmptyDirectoryHandling,
    statistics: WalkStatistics,
}

impl DirectorySnapshotter {
    pub fn new(
        hasher: Arc<dyn FileHasher>,
        interner: Arc<StringInterner>,
        default_excludes: DefaultExcludes,
    ) -> Self {
        Self {
            hasher,
            stat: Arc::new(DefaultStat),
            interner,
            default_excludes,
            empty_directory_handling: EmptyDirectoryHandling::IncludeEmptyDirs,
            statistics: WalkStatistics::new(),
        }
    }

    /// Classify roots, links and files with `stat` instead of [`DefaultStat`]
    pub fn with_stat(mut self, stat: Arc<dyn Stat>) -> Self {
        self.stat = stat;
        self
    }

    /// Handling of empty directories below the root; the root itself is always kept
    pub fn with_empty_directory_handling(mut self, handling: EmptyDirectoryHandling) -> Self {
        self.empty_directory_handling = handling;
        self
    }

    pub fn statistics(&self) -> &WalkStatistics {
        &self.statistics
    }

    pub fn interner(&self) -> &Arc<StringInterner> {
        &self.interner
    }

    /// Snapshot `path` without a filter
    pub fn snapshot_all(&self, path: &Path) -> Result<FileSystemLocationSnapshot> {
        Ok(self.snapshot(path, None, &mut |_| {})?.snapshot)
    }

    /// Snapshot the location at `path`
    ///
    /// `unfiltered` receives the largest subtrees the filter left intact:
    /// the root itself when nothing was filtered, otherwise every complete
    /// entry whose parent directory lost children to the filter.
    pub fn snapshot(
        &self,
        path: &Path,
        filter: Option<&dyn SnapshottingFilter>,
        unfiltered: &mut dyn FnMut(&FileSystemLocationSnapshot),
    ) -> Result<SnapshotOutcome> {
        let absolute_path = path_string(path);
        let name = self.interner.intern(file_name(&absolute_path));

        let mut state = WalkState {
            filter,
            tracker: RelativePathTracker::new(),
            parent_directories: Vec::new(),
            filtered: false,
            unfiltered: Vec::new(),
        };

        let snapshot = match self.snapshot_root(path, absolute_path, name, &mut state)? {
            Some(snapshot) => snapshot,
            None => {
                return Err(SnapshotterError::Snapshot(
                    vfs_core::SnapshotError::NoOpenDirectory,
                ))
            }
        };

        if state.filtered {
            debug!(
                path = %path.display(),
                retained = state.unfiltered.len(),
                "Snapshot was filtered"
            );
            for retained in &state.unfiltered {
                unfiltered(retained);
            }
        } else {
            unfiltered(&snapshot);
        }

        Ok(SnapshotOutcome {
            snapshot,
            filtered: state.filtered,
        })
    }

    fn snapshot_root(
        &self,
        path: &Path,
        absolute_path: Arc<str>,
        name: Arc<str>,
        state: &mut WalkState<'_>,
    ) -> Result<Option<FileSystemLocationSnapshot>> {
        let stat = self.stat.stat(path);
        let Some(access_type) = directory_access(&stat) else {
            return Ok(Some(self.snapshot_leaf(path, absolute_path, name, stat)));
        };
        if access_type == AccessType::Direct {
            return self.walk(path, None, name, AccessType::Direct, false, state);
        }

        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                return Ok(Some(self.unreadable(absolute_path, name, AccessType::ViaSymlink, e)))
            }
        };
        let mapping = SymbolicLinkMapping {
            source: absolute_path,
            target: canonical.clone(),
        };
        self.walk(&canonical, Some(&mapping), name, AccessType::ViaSymlink, false, state)
    }

    /// Walk the directory at `root`
    ///
    /// A nested walk continues the relative path of the link that started it.
    fn walk(
        &self,
        root: &Path,
        mapping: Option<&SymbolicLinkMapping>,
        root_name: Arc<str>,
        root_access_type: AccessType,
        nested: bool,
        state: &mut WalkState<'_>,
    ) -> Result<Option<FileSystemLocationSnapshot>> {
        let mut walk = Walk {
            mapping,
            nested,
            builder: MerkleDirectorySnapshotBuilder::sorting_required(),
            frames: Vec::new(),
        };

        let mut entries = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(next) = entries.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    self.visit_failed(err, &mut walk, state)?;
                    continue;
                }
            };

            let depth = entry.depth();
            self.close_frames(depth, &mut walk, state)?;

            if depth == 0 {
                if !nested {
                    state.tracker.enter(root_name.clone());
                }
                state.parent_directories.push(entry.path().to_path_buf());
                let absolute_path = walk.remap(entry.path());
                walk.frames.push(Frame::new(
                    entry.path(),
                    absolute_path,
                    root_name.clone(),
                    0,
                    root_access_type,
                ));
                continue;
            }

            self.enter_current_frame(&mut walk);
            let name = self.interner.intern(&entry.file_name().to_string_lossy());
            state.tracker.enter(name.clone());

            let file_type = entry.file_type();
            let visited = if file_type.is_dir() {
                if self.should_visit(entry.path(), &name, true, &mut walk.builder, state) {
                    state.parent_directories.push(entry.path().to_path_buf());
                    let absolute_path = walk.remap(entry.path());
                    walk.frames.push(Frame::new(
                        entry.path(),
                        absolute_path,
                        name,
                        depth,
                        AccessType::Direct,
                    ));
                    // left when the frame closes
                    continue;
                }
                entries.skip_current_dir();
                Visited::Skipped
            } else if file_type.is_symlink() {
                self.visit_symlink(entry.path(), &name, &mut walk, state)?
            } else if self.should_visit(entry.path(), &name, false, &mut walk.builder, state) {
                let absolute_path = walk.remap(entry.path());
                let stat = self.stat.stat(entry.path());
                Visited::Leaf(self.snapshot_leaf(entry.path(), absolute_path, name, stat))
            } else {
                Visited::Skipped
            };

            walk.add(visited);
            state.tracker.leave();
        }

        self.close_frames(0, &mut walk, state)?;
        Ok(walk.builder.into_result()?)
    }

    fn visit_symlink(
        &self,
        path: &Path,
        name: &Arc<str>,
        walk: &mut Walk<'_>,
        state: &mut WalkState<'_>,
    ) -> Result<Visited> {
        let absolute_path = walk.remap(path);
        let stat = self.stat.stat(path);
        if directory_access(&stat).is_none() {
            if !self.should_visit(path, name, false, &mut walk.builder, state) {
                return Ok(Visited::Skipped);
            }
            return Ok(Visited::Leaf(self.snapshot_leaf(path, absolute_path, name.clone(), stat)));
        }

        if !self.should_visit(path, name, true, &mut walk.builder, state) {
            return Ok(Visited::Skipped);
        }
        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                return Ok(Visited::Leaf(self.unreadable(
                    absolute_path,
                    name.clone(),
                    AccessType::ViaSymlink,
                    e,
                )));
            }
        };
        if state.parent_directories.iter().any(|parent| *parent == canonical) {
            debug!(
                link = %path.display(),
                target = %canonical.display(),
                "Skipping symbolic link cycle"
            );
            self.statistics.record_cycle();
            return Ok(Visited::Skipped);
        }

        let mapping = SymbolicLinkMapping {
            source: absolute_path,
            target: canonical.clone(),
        };
        let outer_filtered = std::mem::replace(&mut state.filtered, false);
        let nested = self.walk(
            &canonical,
            Some(&mapping),
            name.clone(),
            AccessType::ViaSymlink,
            true,
            state,
        )?;
        let nested_filtered = state.filtered;
        state.filtered |= outer_filtered;

        Ok(match nested {
            None => Visited::Skipped,
            Some(snapshot) if snapshot.as_directory().is_some() => Visited::Directory {
                snapshot,
                unfiltered: !nested_filtered,
            },
            Some(snapshot) => Visited::Leaf(snapshot),
        })
    }

    /// Record a walk error against the entry it belongs to
    fn visit_failed(
        &self,
        err: walkdir::Error,
        walk: &mut Walk<'_>,
        state: &mut WalkState<'_>,
    ) -> Result<()> {
        let Some(path) = err.path().map(Path::to_path_buf) else {
            return Err(SnapshotterError::Walk {
                path: walk.frames.last().map(|f| f.path.clone()).unwrap_or_default(),
                source: err,
            });
        };

        // directory was entered but could not be listed
        if let Some(frame) = walk.frames.last_mut() {
            if frame.path == path && !frame.entered {
                frame.error = Some(into_io_error(err));
                return Ok(());
            }
        }

        let depth = err.depth();
        self.close_frames(depth, walk, state)?;
        self.enter_current_frame(walk);

        let absolute_path = walk.remap(&path);
        let name = self.interner.intern(file_name(&absolute_path));
        let access_type = if depth == 0 {
            walk.root_access_type()
        } else {
            AccessType::Direct
        };
        let leaf = self.unreadable(absolute_path, name, access_type, into_io_error(err));
        walk.add(Visited::Leaf(leaf));
        Ok(())
    }

    fn enter_current_frame(&self, walk: &mut Walk<'_>) {
        if let Some(frame) = walk.frames.last_mut() {
            if !frame.entered {
                // a nested root is a symlinked directory below the snapshot root
                let handling = if frame.depth == 0 && !walk.nested {
                    EmptyDirectoryHandling::IncludeEmptyDirs
                } else {
                    self.empty_directory_handling
                };
                walk.builder.enter_directory(
                    frame.access_type,
                    frame.absolute_path.clone(),
                    frame.name.clone(),
                    handling,
                );
                frame.entered = true;
            }
        }
    }

    /// Close every open directory at `depth` or deeper
    fn close_frames(
        &self,
        depth: usize,
        walk: &mut Walk<'_>,
        state: &mut WalkState<'_>,
    ) -> Result<()> {
        while walk.frames.last().map_or(false, |frame| frame.depth >= depth) {
            self.enter_current_frame_unless_failed(walk);
            let Some(frame) = walk.frames.pop() else { break };

            state.parent_directories.pop();
            if frame.depth > 0 || !walk.nested {
                state.tracker.leave();
            }

            if let Some(error) = frame.error {
                let leaf =
                    self.unreadable(frame.absolute_path, frame.name, frame.access_type, error);
                walk.add(Visited::Leaf(leaf));
                continue;
            }

            let unfiltered = walk.builder.is_current_level_unfiltered();
            let closed = walk.builder.leave_directory()?;
            self.statistics.record_directory();

            match closed {
                Some(directory) if unfiltered => {
                    if let Some(parent) = walk.frames.last_mut() {
                        parent.unfiltered.push(directory);
                    }
                }
                _ if !unfiltered => state.unfiltered.extend(frame.unfiltered),
                _ => {}
            }
        }
        Ok(())
    }

    fn enter_current_frame_unless_failed(&self, walk: &mut Walk<'_>) {
        if walk.frames.last().map_or(false, |frame| frame.error.is_none()) {
            self.enter_current_frame(walk);
        }
    }

    fn should_visit(
        &self,
        path: &Path,
        name: &str,
        is_directory: bool,
        builder: &mut MerkleDirectorySnapshotBuilder,
        state: &mut WalkState<'_>,
    ) -> bool {
        let excluded = if is_directory {
            self.default_excludes.exclude_dir(name)
        } else {
            self.default_excludes.exclude_file(name)
        };
        if excluded {
            return false;
        }

        let Some(filter) = state.filter else {
            return true;
        };
        if filter.should_visit(path, name, is_directory, state.tracker.segments()) {
            return true;
        }
        builder.mark_current_level_as_filtered();
        state.filtered = true;
        false
    }

    /// Snapshot a location the walk does not descend into
    fn snapshot_leaf(
        &self,
        path: &Path,
        absolute_path: Arc<str>,
        name: Arc<str>,
        stat: std::result::Result<FileMetadata, StatError>,
    ) -> FileSystemLocationSnapshot {
        let metadata = match stat {
            Ok(metadata) => metadata,
            Err(e) => return self.unreadable(absolute_path, name, AccessType::Direct, e.into_io()),
        };
        match metadata.file_type {
            FileType::RegularFile => self.snapshot_file(path, absolute_path, name, &metadata),
            FileType::Missing if metadata.is_broken_symlink() => {
                FileSystemLocationSnapshot::broken_link(absolute_path, name)
            }
            FileType::Missing => {
                FileSystemLocationSnapshot::missing(absolute_path, name, metadata.access_type)
            }
            FileType::Directory => {
                let error =
                    io::Error::new(io::ErrorKind::Other, "became a directory during the walk");
                self.unreadable(absolute_path, name, metadata.access_type, error)
            }
        }
    }

    fn snapshot_file(
        &self,
        path: &Path,
        absolute_path: Arc<str>,
        name: Arc<str>,
        metadata: &FileMetadata,
    ) -> FileSystemLocationSnapshot {
        let access_type = metadata.access_type;
        match self.hasher.hash(path, metadata.length, metadata.last_modified_millis) {
            Ok(hash) => {
                self.statistics.record_file();
                FileSystemLocationSnapshot::regular_file(absolute_path, name, hash, *metadata)
            }
            Err(e) => self.unreadable(absolute_path, name, access_type, e),
        }
    }

    fn unreadable(
        &self,
        absolute_path: Arc<str>,
        name: Arc<str>,
        access_type: AccessType,
        error: io::Error,
    ) -> FileSystemLocationSnapshot {
        warn!(path = %absolute_path, "Could not read file system location: {}", error);
        self.statistics.record_unreadable();
        FileSystemLocationSnapshot::unreadable(absolute_path, name, access_type, error)
    }
}

impl Default for DirectorySnapshotter {
    fn default() -> Self {
        Self::new(
            Arc::new(DefaultFileHasher),
            Arc::new(StringInterner::new()),
            DefaultExcludes::default(),
        )
    }
}

impl std::fmt::Debug for DirectorySnapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorySnapshotter")
            .field("default_excludes", &self.default_excludes.patterns())
            .field("empty_directory_handling", &self.empty_directory_handling)
            .field("statistics", &self.statistics)
            .finish()
    }
}

/// Reports paths below a followed link relative to the link itself
#[derive(Debug)]
struct SymbolicLinkMapping {
    source: Arc<str>,
    target: PathBuf,
}

impl SymbolicLinkMapping {
    fn remap(&self, path: &Path) -> Arc<str> {
        match path.strip_prefix(&self.target) {
            Ok(rest) if rest.as_os_str().is_empty() => self.source.clone(),
            Ok(rest) => {
                Arc::from(format!("{}{}{}", self.source, MAIN_SEPARATOR, rest.display()))
            }
            Err(_) => path_string(path),
        }
    }
}

/// State shared by a walk and the walks nested in it
struct WalkState<'f> {
    filter: Option<&'f dyn SnapshottingFilter>,
    tracker: RelativePathTracker,
    /// Real paths of the open directories, for cycle detection
    parent_directories: Vec<PathBuf>,
    filtered: bool,
    /// Unfiltered subtrees whose parent was filtered
    unfiltered: Vec<FileSystemLocationSnapshot>,
}

/// One walk over a single real directory tree
struct Walk<'m> {
    mapping: Option<&'m SymbolicLinkMapping>,
    nested: bool,
    builder: MerkleDirectorySnapshotBuilder,
    frames: Vec<Frame>,
}

impl Walk<'_> {
    fn remap(&self, path: &Path) -> Arc<str> {
        match self.mapping {
            Some(mapping) => mapping.remap(path),
            None => path_string(path),
        }
    }

    fn root_access_type(&self) -> AccessType {
        if self.mapping.is_some() {
            AccessType::ViaSymlink
        } else {
            AccessType::Direct
        }
    }

    fn add(&mut self, visited: Visited) {
        match visited {
            Visited::Skipped => {}
            Visited::Leaf(snapshot) => {
                self.builder.visit_leaf_element(snapshot.clone());
                if let Some(frame) = self.frames.last_mut() {
                    frame.unfiltered.push(snapshot);
                }
            }
            Visited::Directory { snapshot, unfiltered } => {
                self.builder.visit_directory(snapshot.clone());
                if !unfiltered {
                    self.builder.mark_current_level_as_filtered();
                } else if let Some(frame) = self.frames.last_mut() {
                    frame.unfiltered.push(snapshot);
                }
            }
        }
    }
}

/// An open directory of the walk
struct Frame {
    path: PathBuf,
    absolute_path: Arc<str>,
    name: Arc<str>,
    depth: usize,
    access_type: AccessType,
    /// Entered into the builder; happens when the first child shows up
    entered: bool,
    error: Option<io::Error>,
    unfiltered: Vec<FileSystemLocationSnapshot>,
}

impl Frame {
    fn new(
        path: &Path,
        absolute_path: Arc<str>,
        name: Arc<str>,
        depth: usize,
        access_type: AccessType,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            absolute_path,
            name,
            depth,
            access_type,
            entered: false,
            error: None,
            unfiltered: Vec::new(),
        }
    }
}

enum Visited {
    Skipped,
    Leaf(FileSystemLocationSnapshot),
    Directory {
        snapshot: FileSystemLocationSnapshot,
        unfiltered: bool,
    },
}

/// Access type of a directory, `None` for anything else
fn directory_access(stat: &std::result::Result<FileMetadata, StatError>) -> Option<AccessType> {
    match stat {
        Ok(metadata) if metadata.file_type == FileType::Directory => Some(metadata.access_type),
        _ => None,
    }
}

fn path_string(path: &Path) -> Arc<str> {
    Arc::from(&*path.to_string_lossy())
}

fn into_io_error(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
}
