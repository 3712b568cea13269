//! extsync - editor extension and settings sync
//!
//! Backs up the installed extensions and settings of the editor to a GitHub
//! repository and restores them elsewhere.
//!
//! Available as the `extsync` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use extsync::cli::commands::{Cli, Commands};
use extsync::cli::{auth, config, extensions, repo, settings};
use extsync::error::{ExtsyncError, Result};

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

/// Print an error once; the message carries its own next-step hint
fn handle_error(e: &ExtsyncError) {
    match e {
        ExtsyncError::Cancelled => tracing::debug!("Command cancelled by user"),
        _ => tracing::debug!("Command failed: {:?}", e),
    }
    eprintln!("Error: {}", e);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth(args) => auth::handle_auth(args.command).await,
        Commands::Repo(args) => repo::handle_repo(args.command),
        Commands::Extensions(args) => extensions::handle_extensions(args.command).await,
        Commands::Settings(args) => settings::handle_settings(args.command).await,
        Commands::Config(args) => config::handle_config(args.command),
    }
}
