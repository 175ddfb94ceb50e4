//! File metadata and the stat call

use crate::error::StatError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Type of a file system location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    RegularFile,
    Directory,
    /// Nonexistent paths and broken symbolic links
    Missing,
}

/// How a location was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    Direct,
    ViaSymlink,
}

impl AccessType {
    pub fn via_symlink(is_symlink: bool) -> Self {
        if is_symlink {
            Self::ViaSymlink
        } else {
            Self::Direct
        }
    }
}

/// Raw metadata reported by [`Stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_type: FileType,
    pub length: u64,
    pub last_modified_millis: i64,
    pub access_type: AccessType,
}

impl FileMetadata {
    pub fn file(last_modified_millis: i64, length: u64, access_type: AccessType) -> Self {
        Self {
            file_type: FileType::RegularFile,
            length,
            last_modified_millis,
            access_type,
        }
    }

    pub fn directory(access_type: AccessType) -> Self {
        Self {
            file_type: FileType::Directory,
            length: 0,
            last_modified_millis: 0,
            access_type,
        }
    }

    pub fn missing(access_type: AccessType) -> Self {
        Self {
            file_type: FileType::Missing,
            length: 0,
            last_modified_millis: 0,
            access_type,
        }
    }

    /// A symbolic link whose target does not exist
    pub fn broken_symlink() -> Self {
        Self::missing(AccessType::ViaSymlink)
    }

    pub fn is_broken_symlink(&self) -> bool {
        self.file_type == FileType::Missing && self.access_type == AccessType::ViaSymlink
    }

    /// Whether the file content may be reused without rehashing
    pub fn is_content_up_to_date(&self, other: &FileMetadata) -> bool {
        self.length == other.length && self.last_modified_millis == other.last_modified_millis
    }
}

/// Reads the type and metadata of a location
pub trait Stat: Send + Sync {
    fn stat(&self, path: &Path) -> Result<FileMetadata, StatError>;
}

/// [`Stat`] backed by `std::fs`
///
/// Symbolic links are followed once; the result is tagged
/// [`AccessType::ViaSymlink`]. A dangling link is reported as missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStat;

impl Stat for DefaultStat {
    fn stat(&self, path: &Path) -> Result<FileMetadata, StatError> {
        let link_metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileMetadata::missing(AccessType::Direct));
            }
            Err(e) => return Err(StatError::from_io(path.display().to_string(), e)),
        };

        let is_symlink = link_metadata.file_type().is_symlink();
        let metadata = if is_symlink {
            match fs::metadata(path) {
                Ok(target) => target,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(FileMetadata::broken_symlink());
                }
                Err(e) => return Err(StatError::from_io(path.display().to_string(), e)),
            }
        } else {
            link_metadata
        };

        let access_type = AccessType::via_symlink(is_symlink);
        if metadata.is_dir() {
            Ok(FileMetadata::directory(access_type))
        } else if metadata.is_file() {
            Ok(FileMetadata::file(
                last_modified_millis(&metadata),
                metadata.len(),
                access_type,
            ))
        } else {
            Err(StatError::from_io(
                path.display().to_string(),
                io::Error::new(io::ErrorKind::Unsupported, "not a regular file or directory"),
            ))
        }
    }
}

/// Modification time in milliseconds since the epoch, 0 when unavailable
pub fn last_modified_millis(metadata: &fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |duration| duration.as_millis() as i64)
}
