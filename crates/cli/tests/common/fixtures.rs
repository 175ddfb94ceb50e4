//! On-disk trees for command tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small project tree in a temporary directory
pub struct TestTree {
    temp: TempDir,
}

impl TestTree {
    /// `project/` with `README.md`, `src/main.rs`, `src/lib.rs`, an empty `docs/`
    /// and a `.git/` directory
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("project");
        fs::create_dir_all(root.join("src"))?;
        fs::create_dir_all(root.join("docs"))?;
        fs::create_dir_all(root.join(".git"))?;
        fs::write(root.join("README.md"), "# project\n")?;
        fs::write(root.join("src/main.rs"), "fn main() {}\n")?;
        fs::write(root.join("src/lib.rs"), "pub fn lib() {}\n")?;
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n")?;
        Ok(Self { temp })
    }

    pub fn dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("project")
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}
