//! Default excludes applied to every walk
//!
//! Patterns use gitignore syntax and are matched against file names only.
//! A trailing `/` restricts a pattern to directories.

use crate::error::{Result, SnapshotterError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Version control metadata and editor or OS droppings
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git/",
    ".svn/",
    ".hg/",
    ".bzr/",
    "CVS/",
    "SCCS/",
    "vssver.scc",
    // Editor backups and lock files
    "*~",
    "\\#*#",
    ".#*",
    "%*%",
    // macOS metadata
    ".DS_Store",
    "._*",
];

/// Compiled default excludes
#[derive(Debug, Clone)]
pub struct DefaultExcludes {
    patterns: Vec<String>,
    matcher: Gitignore,
}

impl DefaultExcludes {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GitignoreBuilder::new("");
        for pattern in &patterns {
            builder
                .add_line(None, pattern)
                .map_err(|source| SnapshotterError::InvalidExclude {
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        let matcher = builder.build().map_err(|source| SnapshotterError::InvalidExclude {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { patterns, matcher })
    }

    /// Nothing excluded
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            matcher: Gitignore::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn exclude_dir(&self, name: &str) -> bool {
        self.matcher.matched(Path::new(name), true).is_ignore()
    }

    pub fn exclude_file(&self, name: &str) -> bool {
        self.matcher.matched(Path::new(name), false).is_ignore()
    }
}

impl Default for DefaultExcludes {
    fn default() -> Self {
        // the built-in patterns are known to compile
        Self::new(DEFAULT_EXCLUDES.iter().copied()).unwrap_or_else(|_| Self::none())
    }
}
