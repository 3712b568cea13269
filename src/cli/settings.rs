//! Settings sync CLI command handlers

use crate::cli::commands::SettingsCommand;
use crate::cli::session::Session;
use crate::core::prompt::TerminalPrompter;
use crate::error::Result;
use crate::sync::orchestrator::{SecondaryOutcome, SyncOrchestrator};
use crate::sync::settings::{SettingsLocation, REMOTE_SETTINGS_FILE, SETTINGS_FILE};

/// Handle settings commands
pub async fn handle_settings(command: SettingsCommand) -> Result<()> {
    let prompter = TerminalPrompter;
    let session = Session::open(&prompter)?;
    let location = SettingsLocation::from_config(&session.config)?;
    let orchestrator = SyncOrchestrator::new(&session.client, session.repo.clone(), &prompter);

    match command {
        SettingsCommand::Sync => {
            let report = orchestrator.sync_settings(&location).await?;
            println!(
                "✓ Uploaded {} to {}",
                SETTINGS_FILE,
                orchestrator.repository()
            );
            match report.remote {
                SecondaryOutcome::Skipped => {}
                SecondaryOutcome::Done(_) => println!("✓ Uploaded {}", REMOTE_SETTINGS_FILE),
                SecondaryOutcome::Failed(e) => {
                    eprintln!("Warning: could not upload {}: {}", REMOTE_SETTINGS_FILE, e)
                }
            }
        }
        SettingsCommand::Import => {
            let report = orchestrator.import_settings(&location).await?;
            println!("✓ Wrote {}", report.primary.display());
            match report.remote {
                SecondaryOutcome::Skipped => {}
                SecondaryOutcome::Done(path) => println!("✓ Wrote {}", path.display()),
                SecondaryOutcome::Failed(e) => {
                    eprintln!("Warning: could not restore {}: {}", REMOTE_SETTINGS_FILE, e)
                }
            }
        }
    }

    Ok(())
}
