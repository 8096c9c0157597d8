// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hubsync")]
#[command(about = "Mirror public container-registry repositories into a private registry")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON mirror configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root of the catalog cache and per-repository state
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Refresh the catalog cache (repository list and per-repository tag lists)
    Init {
        /// Mirror every tag instead of the configured first-N truncation
        #[arg(long)]
        all_tags: bool,
    },
    /// Run the pull phase for one repository
    Pull {
        /// Repository name under the data directory
        repo: Option<String>,
        /// Operate on this dat directory directly (worker-container mode)
        #[arg(long)]
        dat: Option<PathBuf>,
    },
    /// Run the push phase for one repository
    Push {
        /// Repository name under the data directory
        repo: Option<String>,
        /// Operate on this dat directory directly (worker-container mode)
        #[arg(long)]
        dat: Option<PathBuf>,
        /// Destination profile name from the configuration
        #[arg(long, default_value = "mirror")]
        profile: String,
    },
    /// Orchestrate worker containers across repositories
    Run {
        /// Repositories to sync (all cached repositories when omitted)
        repos: Vec<String>,
        /// Worker image to run per repository
        #[arg(long)]
        image: Option<String>,
        /// Maximum concurrently running workers
        #[arg(long)]
        concurrency: Option<usize>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Report skipped and still-unresolved tags from the progress ledger
    Check {
        /// Limit the report to one repository
        repo: Option<String>,
    },
    /// Show a repository's descriptions from the metadata API
    Describe { repo: String },
}
