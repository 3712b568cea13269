//! Repository CLI command handlers

use crate::cli::commands::RepoCommand;
use crate::core::config::{Config, FileConfigSink};
use crate::core::prompt::{Prompter, TerminalPrompter};
use crate::core::repository::{change_repository, RepositoryCoordinate};
use crate::error::{ExtsyncError, Result};

/// Handle repository commands
pub fn handle_repo(command: RepoCommand) -> Result<()> {
    match command {
        RepoCommand::Set { repository } => handle_set(repository),
        RepoCommand::Show => handle_show(),
    }
}

/// Replace the sync repository, asking for it when not given
fn handle_set(repository: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let value = match repository {
        Some(value) => value,
        None => {
            if let Some(current) = config.repository.as_deref() {
                println!("Current repository: {}", current);
            }
            TerminalPrompter
                .input("New GitHub repository (owner/repo):")?
                .ok_or(ExtsyncError::Cancelled)?
        }
    };

    let coordinate = change_repository(&mut config, &value, &FileConfigSink::new()?)?;
    println!("✓ Syncing with {}", coordinate);
    Ok(())
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;
    match config.repository.as_deref() {
        Some(value) => {
            let coordinate = RepositoryCoordinate::parse(value)?;
            println!("Repository: {}", coordinate);
            println!("  URL: {}", coordinate.github_url());
            println!("  Extension list: {}", config.file_name);
        }
        None => {
            println!("Repository: Not configured");
            println!();
            println!("  Set one with: extsync repo set owner/repo");
        }
    }
    Ok(())
}
