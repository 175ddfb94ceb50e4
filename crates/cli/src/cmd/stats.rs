//! Snapshot locations into a VFS and summarise it

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;
use vfs_cli::config;
use vfs_cli::util;
use vfs_hierarchy::VirtualFileSystem;
use vfs_snapshotter::SnapshotStatistics;

pub fn run(config_path: Option<&Path>, paths: &[PathBuf]) -> Result<()> {
    let (config, loaded_from) = config::load(config_path)?;
    if let Some(path) = &loaded_from {
        info!(config = %path.display(), "Loaded configuration");
    }
    let snapshotter = config.snapshotter()?;
    let vfs = VirtualFileSystem::new(config.case_sensitivity.resolve());

    for path in paths {
        let path = util::absolute_path(path)?;
        let absolute = path.to_string_lossy();
        vfs.read_location(&absolute, |_| snapshotter.snapshot_all(&path))
            .with_context(|| format!("Failed to snapshot {}", path.display()))?;
    }

    let root = vfs.current_root();
    let statistics = SnapshotStatistics::of(&root);

    println!("{}", "Virtual File System".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    for snapshot in root.root_snapshots() {
        println!(
            "  {} {}",
            util::short_hash(&snapshot.hash()).yellow(),
            snapshot.absolute_path()
        );
    }
    println!();
    println!("Roots:         {}", statistics.roots);
    println!("Files:         {}", statistics.regular_files);
    println!("Directories:   {}", statistics.directories);
    println!("Missing:       {}", statistics.missing);
    println!("Broken links:  {}", statistics.broken_links);
    if statistics.unreadable > 0 {
        println!("Unreadable:    {}", statistics.unreadable.to_string().red());
    } else {
        println!("Unreadable:    0");
    }
    println!();
    println!(
        "{}",
        format!(
            "Walked {} and {}",
            util::plural(snapshotter.statistics().visited_files(), "file"),
            util::plural(snapshotter.statistics().visited_directories(), "directory"),
        )
        .dimmed()
    );
    Ok(())
}
