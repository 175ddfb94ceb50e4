//! Library side of the `vfs` command line tool

pub mod config;
pub mod util;

pub use config::{CaseSensitivitySetting, VfsConfig};
