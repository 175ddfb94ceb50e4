//! Print a snapshot tree

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vfs_cli::config;
use vfs_cli::util;
use vfs_core::{
    AccessType, EmptyDirectoryHandling, FileSystemLocationSnapshot, SnapshotKind,
    SnapshotVisitResult,
};
use vfs_snapshotter::{DepthFilter, SnapshottingFilter};

pub fn run(
    config_path: Option<&Path>,
    path: &Path,
    exclude_empty_dirs: bool,
    depth: Option<usize>,
) -> Result<()> {
    let (config, _) = config::load(config_path)?;
    let mut snapshotter = config.snapshotter()?;
    if exclude_empty_dirs {
        snapshotter =
            snapshotter.with_empty_directory_handling(EmptyDirectoryHandling::ExcludeEmptyDirs);
    }

    let path = util::absolute_path(path)?;
    let filter = depth.map(DepthFilter::new);
    let outcome = snapshotter
        .snapshot(
            &path,
            filter.as_ref().map(|f| f as &dyn SnapshottingFilter),
            &mut |_| {},
        )
        .with_context(|| format!("Failed to snapshot {}", path.display()))?;

    let mut print = |snapshot: &FileSystemLocationSnapshot, level: usize| {
        println!("{}{}", "  ".repeat(level), describe(snapshot, level == 0));
        SnapshotVisitResult::Continue
    };
    outcome.snapshot.accept(&mut print);

    println!();
    if outcome.filtered {
        println!("{}", "Some entries were filtered out".yellow());
    }
    println!("{}", snapshotter.statistics().to_string().dimmed());
    Ok(())
}

fn describe(snapshot: &FileSystemLocationSnapshot, is_root: bool) -> String {
    let name = if is_root {
        snapshot.absolute_path().to_string()
    } else {
        snapshot.name().to_string()
    };
    let link = if snapshot.access_type() == AccessType::ViaSymlink {
        " (symlink)".dimmed().to_string()
    } else {
        String::new()
    };
    let hash = util::short_hash(&snapshot.hash()).dimmed().to_string();

    match snapshot.kind() {
        SnapshotKind::Directory => format!("{}/{} {}", name.blue().bold(), link, hash),
        SnapshotKind::RegularFile => format!("{}{} {}", name, link, hash),
        SnapshotKind::Missing => format!("{} {}", name.dimmed(), "missing".yellow()),
        SnapshotKind::BrokenLink => format!("{} {}", name.dimmed(), "broken link".yellow()),
        SnapshotKind::Unreadable => format!("{} {}", name.red(), "unreadable".red()),
    }
}
