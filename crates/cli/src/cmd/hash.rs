//! Print location hashes

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vfs_cli::config;
use vfs_cli::util;

pub fn run(config_path: Option<&Path>, paths: &[PathBuf]) -> Result<()> {
    let (config, _) = config::load(config_path)?;
    let snapshotter = config.snapshotter()?;

    for path in paths {
        let path = util::absolute_path(path)?;
        let snapshot = snapshotter
            .snapshot_all(&path)
            .with_context(|| format!("Failed to snapshot {}", path.display()))?;
        println!("{}  {}", snapshot.hash(), path.display());
    }
    Ok(())
}
