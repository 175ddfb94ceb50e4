//! `vfs stats`

use crate::common::TestTree;
use crate::vfs;
use anyhow::Result;

#[test]
fn test_stats_counts_retained_entries() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "stats", "project").assert_success()?;

    assert!(result.contains_stdout("Roots:         1"));
    assert!(result.contains_stdout("Files:         3"));
    assert!(result.contains_stdout("Directories:   3"));
    assert!(result.contains_stdout("Unreadable:    0"));
    Ok(())
}

#[test]
fn test_stats_merges_nested_locations() -> Result<()> {
    let tree = TestTree::new()?;
    let result =
        vfs!(tree.dir(), "stats", "project/src", "project", "project/missing").assert_success()?;

    // the project snapshot replaces src; missing lies inside the complete project
    assert!(result.contains_stdout("Roots:         1"));
    assert!(result.contains_stdout("Files:         3"));
    assert!(result.contains_stdout("Missing:       0"));
    Ok(())
}
