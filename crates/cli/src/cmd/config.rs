//! Configuration command
//!
//! Shows the effective configuration and where it came from.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use vfs_cli::config::{self, CONFIG_ENV};

/// Print the effective configuration
pub fn run_show(config_path: Option<&Path>) -> Result<()> {
    let (config, loaded_from) = config::load(config_path)?;

    println!("{}", "Configuration".bold());
    match &loaded_from {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => {
            let default = config::resolve_path(config_path)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{}: {} {}\n",
                "Location".dimmed(),
                default.dimmed(),
                "(not found, using defaults)".yellow()
            );
        }
    }

    println!(
        "  {} = {:?} {}",
        "case_sensitivity".cyan(),
        config.case_sensitivity,
        format!("({:?})", config.case_sensitivity.resolve()).dimmed()
    );
    println!("  {} = {}", "include_empty_dirs".cyan(), config.include_empty_dirs);
    println!("  {} =", "default_excludes".cyan());
    for pattern in &config.default_excludes {
        println!("    {}", pattern);
    }

    println!(
        "\n{}",
        format!("Override the location with --config or ${}", CONFIG_ENV).dimmed()
    );
    Ok(())
}

/// Print an example configuration file
pub fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}
