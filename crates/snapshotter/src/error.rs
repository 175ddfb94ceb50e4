//! Errors raised while snapshotting directories

use std::path::PathBuf;
use thiserror::Error;
use vfs_core::SnapshotError;

#[derive(Debug, Error)]
pub enum SnapshotterError {
    #[error("invalid exclude pattern '{pattern}'")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("could not walk '{}'", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, SnapshotterError>;
