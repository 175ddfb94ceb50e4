//! User configuration
//!
//! Looked up at `--config`, then `$VFS_CONFIG`, then
//! `<config dir>/vfs/config.toml`. A missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vfs_core::{CaseSensitivity, DefaultFileHasher, EmptyDirectoryHandling};
use vfs_snapshotter::{DefaultExcludes, DirectorySnapshotter, StringInterner, DEFAULT_EXCLUDES};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "VFS_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivitySetting {
    Sensitive,
    Insensitive,
    /// Case-insensitive on Windows and macOS
    Platform,
}

impl CaseSensitivitySetting {
    pub fn resolve(self) -> CaseSensitivity {
        match self {
            Self::Sensitive => CaseSensitivity::CaseSensitive,
            Self::Insensitive => CaseSensitivity::CaseInsensitive,
            Self::Platform => CaseSensitivity::platform(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VfsConfig {
    pub case_sensitivity: CaseSensitivitySetting,
    /// Gitignore-style patterns matched against file names
    pub default_excludes: Vec<String>,
    pub include_empty_dirs: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivitySetting::Platform,
            default_excludes: DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect(),
            include_empty_dirs: true,
        }
    }
}

impl VfsConfig {
    pub fn validate(&self) -> Result<()> {
        self.excludes()?;
        Ok(())
    }

    pub fn excludes(&self) -> Result<DefaultExcludes> {
        DefaultExcludes::new(self.default_excludes.iter().cloned())
            .context("Invalid default_excludes")
    }

    pub fn empty_directory_handling(&self) -> EmptyDirectoryHandling {
        if self.include_empty_dirs {
            EmptyDirectoryHandling::IncludeEmptyDirs
        } else {
            EmptyDirectoryHandling::ExcludeEmptyDirs
        }
    }

    pub fn snapshotter(&self) -> Result<DirectorySnapshotter> {
        Ok(DirectorySnapshotter::new(
            Arc::new(DefaultFileHasher),
            Arc::new(StringInterner::new()),
            self.excludes()?,
        )
        .with_empty_directory_handling(self.empty_directory_handling()))
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vfs").join("config.toml"))
}

/// Config file to read, in lookup order
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    config_file_path()
}

/// Load and validate the effective configuration
///
/// Returns the path it was read from, if any.
pub fn load(explicit: Option<&Path>) -> Result<(VfsConfig, Option<PathBuf>)> {
    let Some(path) = resolve_path(explicit) else {
        return Ok((VfsConfig::default(), None));
    };

    if !path.exists() {
        if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok((VfsConfig::default(), None));
    }

    let config = load_from(&path)?;
    Ok((config, Some(path)))
}

pub fn load_from(path: &Path) -> Result<VfsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: VfsConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

pub fn example_config() -> String {
    let defaults = VfsConfig::default();
    let excludes = defaults
        .default_excludes
        .iter()
        .map(|p| format!("    {:?},", p))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# vfs configuration

# "sensitive", "insensitive" or "platform"
case_sensitivity = "platform"

# Keep directories without any retained entries
include_empty_dirs = true

# Gitignore-style patterns matched against file names.
# A trailing "/" only matches directories.
default_excludes = [
{excludes}
]
"#
    )
}
