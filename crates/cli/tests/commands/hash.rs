//! `vfs hash`

use crate::common::TestTree;
use crate::vfs;
use anyhow::Result;

#[test]
fn test_hash_is_stable_and_content_sensitive() -> Result<()> {
    let tree = TestTree::new()?;

    let first = vfs!(tree.dir(), "hash", "project", "project/src").assert_success()?;
    let hashes = first.parse_hashes();
    assert_eq!(hashes.len(), 2);
    assert_ne!(hashes[0], hashes[1]);

    let again = vfs!(tree.dir(), "hash", "project", "project/src").assert_success()?;
    assert_eq!(again.parse_hashes(), hashes);

    tree.write("src/main.rs", "fn main() { println!(\"changed\"); }\n")?;
    let changed = vfs!(tree.dir(), "hash", "project", "project/src").assert_success()?;
    let changed = changed.parse_hashes();
    assert_ne!(changed[0], hashes[0]);
    assert_ne!(changed[1], hashes[1]);
    Ok(())
}

#[test]
fn test_hash_ignores_excluded_entries() -> Result<()> {
    let tree = TestTree::new()?;
    let before = vfs!(tree.dir(), "hash", "project").assert_success()?.parse_hashes();

    tree.write(".git/ORIG_HEAD", "abc\n")?;
    tree.write(".DS_Store", "junk")?;
    let after = vfs!(tree.dir(), "hash", "project").assert_success()?.parse_hashes();

    assert_eq!(before, after);
    Ok(())
}

#[test]
fn test_hash_requires_a_path() -> Result<()> {
    let tree = TestTree::new()?;
    vfs!(tree.dir(), "hash").assert_failure()?;
    Ok(())
}
