pub mod analyze;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slft",
    about = "Solidity reconnaissance over scattered documentation",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest URLs and run a pattern scan over discovered Solidity sources
    Analyze {
        /// One or more URLs (space/comma separated); can be repeated
        #[arg(long = "urls")]
        urls: Vec<String>,
        /// Path to a file with one URL per line
        #[arg(long = "urls-file")]
        urls_file: Option<PathBuf>,
        /// Override the run id (default: UTC timestamp)
        #[arg(long = "run-id")]
        run_id: Option<String>,
        /// Base artifacts directory (default: artifacts/<run_id>)
        #[arg(long = "artifacts-dir")]
        artifacts_dir: Option<PathBuf>,
    },
}
