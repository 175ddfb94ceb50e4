//! Error types for snapshot primitives

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or inspecting snapshots
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// The location could not be read when it was snapshotted.
    ///
    /// Carried inside an unreadable snapshot and only surfaced when the
    /// caller asks for the type or content of that location.
    #[error("Could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// `leave_directory` was called without a matching `enter_directory`
    #[error("Directory builder is not inside a directory")]
    NoOpenDirectory,

    /// The builder was asked for a result while directories are still open
    #[error("Directory builder still has {0} open directories")]
    UnbalancedBuilder(usize),

    /// A hash string could not be parsed
    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}

impl SnapshotError {
    pub fn unreadable(path: impl Into<String>, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Failure of a [`Stat`](crate::Stat) call
///
/// A path that does not exist is not an error; it is reported as
/// [`FileType::Missing`](crate::FileType::Missing).
#[derive(Debug, Error)]
pub enum StatError {
    #[error("Permission denied: {path}")]
    PermissionDenied {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not stat {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StatError {
    pub fn from_io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::PermissionDenied { path, .. } | Self::Io { path, .. } => path,
        }
    }

    pub fn into_io(self) -> io::Error {
        match self {
            Self::PermissionDenied { source, .. } | Self::Io { source, .. } => source,
        }
    }
}
