mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            urls,
            urls_file,
            run_id,
            artifacts_dir,
        } => cli::analyze::run(&urls, urls_file.as_deref(), run_id, artifacts_dir).await,
    }
}
