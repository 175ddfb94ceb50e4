//! `vfs snapshot`

use crate::common::TestTree;
use crate::vfs;
use anyhow::Result;

#[test]
fn test_snapshot_prints_tree() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "snapshot", "project").assert_success()?;

    assert!(result.contains_stdout("README.md"));
    assert!(result.contains_stdout("main.rs"));
    assert!(result.contains_stdout("docs"));
    // version control metadata is excluded by default
    assert!(!result.contains_stdout(".git"));
    assert!(!result.contains_stdout("HEAD"));
    assert!(!result.contains_stdout("filtered out"));
    Ok(())
}

#[test]
fn test_snapshot_depth_filters_entries() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "snapshot", "project", "--depth", "1").assert_success()?;

    assert!(result.contains_stdout("README.md"));
    assert!(result.contains_stdout("src"));
    assert!(!result.contains_stdout("main.rs"));
    assert!(result.contains_stdout("filtered out"));
    Ok(())
}

#[test]
fn test_snapshot_exclude_empty_dirs() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "snapshot", "project", "--exclude-empty-dirs").assert_success()?;

    assert!(result.contains_stdout("src"));
    assert!(!result.contains_stdout("docs"));
    Ok(())
}

#[test]
fn test_snapshot_missing_location() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "snapshot", "nowhere").assert_success()?;

    assert!(result.contains_stdout("missing"));
    Ok(())
}
