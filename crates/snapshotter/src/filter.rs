//! Predicates deciding which entries a walk descends into

use std::path::Path;
use std::sync::Arc;

/// Decides whether an entry is part of the snapshot
///
/// `relative_path` holds the segments from the walk root down to and
/// including the entry itself.
pub trait SnapshottingFilter: Send + Sync {
    fn should_visit(
        &self,
        path: &Path,
        name: &str,
        is_directory: bool,
        relative_path: &[Arc<str>],
    ) -> bool;
}

impl<F> SnapshottingFilter for F
where
    F: Fn(&Path, &str, bool, &[Arc<str>]) -> bool + Send + Sync,
{
    fn should_visit(
        &self,
        path: &Path,
        name: &str,
        is_directory: bool,
        relative_path: &[Arc<str>],
    ) -> bool {
        self(path, name, is_directory, relative_path)
    }
}

/// Accepts entries no deeper than `max_depth` below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthFilter {
    max_depth: usize,
}

impl DepthFilter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl SnapshottingFilter for DepthFilter {
    fn should_visit(
        &self,
        _path: &Path,
        _name: &str,
        _is_directory: bool,
        relative_path: &[Arc<str>],
    ) -> bool {
        relative_path.len() <= self.max_depth
    }
}
