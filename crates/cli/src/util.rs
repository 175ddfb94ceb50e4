//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use vfs_core::HashCode;

/// Make `path` absolute against the current directory
///
/// `.` and `..` are resolved lexically so symbolic links in the argument
/// stay visible to the snapshotter.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// First 12 hex digits, enough to tell snapshots apart on screen
pub fn short_hash(hash: &HashCode) -> String {
    let mut hex = hash.to_hex();
    hex.truncate(12);
    hex
}

pub fn plural(count: u64, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
