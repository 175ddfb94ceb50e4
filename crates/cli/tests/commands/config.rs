//! `vfs config`

use crate::common::TestTree;
use crate::vfs;
use anyhow::Result;
use std::fs;

#[test]
fn test_config_example() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "config", "--example").assert_success()?;

    assert!(result.contains_stdout("case_sensitivity = \"platform\""));
    assert!(result.contains_stdout("default_excludes"));
    Ok(())
}

#[test]
fn test_config_defaults_when_missing() -> Result<()> {
    let tree = TestTree::new()?;
    let result = vfs!(tree.dir(), "config").assert_success()?;

    assert!(result.contains_stdout("using defaults"));
    assert!(result.contains_stdout("Platform"));
    Ok(())
}

#[test]
fn test_config_from_file() -> Result<()> {
    let tree = TestTree::new()?;
    let path = tree.dir().join("vfs.toml");
    fs::write(&path, "case_sensitivity = \"insensitive\"\ninclude_empty_dirs = false\n")?;

    let path = path.to_string_lossy().to_string();
    let result = vfs!(tree.dir(), "config", "--config", &path).assert_success()?;
    assert!(result.contains_stdout("Insensitive"));
    assert!(result.contains_stdout("false"));

    // the same file drives snapshotting
    let snapshot = vfs!(tree.dir(), "snapshot", "project", "--config", &path).assert_success()?;
    assert!(!snapshot.contains_stdout("docs"));
    Ok(())
}

#[test]
fn test_config_from_environment() -> Result<()> {
    let tree = TestTree::new()?;
    let path = tree.dir().join("env.toml");
    fs::write(&path, "case_sensitivity = \"sensitive\"\n")?;

    let result = vfs!(tree.dir(), "config")
        .env("VFS_CONFIG", &path.to_string_lossy())
        .assert_success()?;
    assert!(result.contains_stdout("Sensitive"));
    Ok(())
}

#[test]
fn test_invalid_config_fails() -> Result<()> {
    let tree = TestTree::new()?;
    let path = tree.dir().join("bad.toml");
    fs::write(&path, "default_excludes = [\"foo[\"]\n")?;

    let path = path.to_string_lossy().to_string();
    let result = vfs!(tree.dir(), "hash", "project", "--config", &path).assert_failure()?;
    assert!(result.contains_stderr("Invalid configuration"));
    Ok(())
}
