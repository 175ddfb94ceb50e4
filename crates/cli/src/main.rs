//! VFS CLI - vfs command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Environment variable holding the log filter
const LOG_ENV: &str = "VFS_LOG";

/// vfs - Content-addressed snapshots of directory trees
#[derive(Parser)]
#[command(name = "vfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: $VFS_CONFIG or <config dir>/vfs/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot a location and print the tree with hashes
    Snapshot {
        path: PathBuf,
        /// Drop directories without retained entries
        #[arg(long)]
        exclude_empty_dirs: bool,
        /// Only descend this many levels below the root
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print the hash of each location
    Hash {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Snapshot locations into a virtual file system and print statistics
    Stats {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Print an example config file instead
        #[arg(long)]
        example: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Snapshot { path, exclude_empty_dirs, depth } => {
            cmd::snapshot::run(config_path, &path, exclude_empty_dirs, depth)
        }
        Commands::Hash { paths } => cmd::hash::run(config_path, &paths),
        Commands::Stats { paths } => cmd::stats::run(config_path, &paths),
        Commands::Config { example } => {
            if example {
                cmd::config::run_example()
            } else {
                cmd::config::run_show(config_path)
            }
        }
    }
}
