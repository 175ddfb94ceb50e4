//! Errors raised by the virtual file system

use thiserror::Error;
use vfs_core::SnapshotError;

#[derive(Debug, Error)]
pub enum VfsError {
    /// The new root was installed but listeners were not told about it
    #[error("failed to publish snapshot diff")]
    DiffPublication {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, VfsError>;
