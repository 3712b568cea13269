//! Extension sync CLI command handlers

use crate::cli::commands::ExtensionsCommand;
use crate::cli::session::Session;
use crate::core::prompt::TerminalPrompter;
use crate::error::Result;
use crate::github::contents::UpsertKind;
use crate::sync::extensions::VsCodeHost;
use crate::sync::orchestrator::{InstallProgress, SyncOrchestrator};

/// Handle extension commands
pub async fn handle_extensions(command: ExtensionsCommand) -> Result<()> {
    let prompter = TerminalPrompter;
    let session = Session::open(&prompter)?;
    let host = VsCodeHost::from_config(&session.config)?;
    let orchestrator = SyncOrchestrator::new(&session.client, session.repo.clone(), &prompter);
    let file_name = session.config.file_name.as_str();

    match command {
        ExtensionsCommand::Sync => {
            println!("Collecting installed extensions...");
            let report = orchestrator.sync_extensions(&host, file_name).await?;

            let verb = match report.outcome.kind {
                UpsertKind::Created => "Created",
                UpsertKind::Updated => "Updated",
            };
            println!(
                "✓ {} {} in {} ({} extensions)",
                verb,
                file_name,
                orchestrator.repository(),
                report.count
            );
        }
        ExtensionsCommand::Import { all } => {
            let mut print_progress = |progress: InstallProgress<'_>| match progress.error {
                None => println!(
                    "[{}/{}] Installed {}",
                    progress.position,
                    progress.total,
                    progress.entry.label()
                ),
                Some(e) => eprintln!(
                    "[{}/{}] Failed to install {}: {}",
                    progress.position, progress.total, progress.entry.id, e
                ),
            };

            let report = orchestrator
                .import_extensions(&host, file_name, all, &mut print_progress)
                .await?;

            if report.installed.is_empty() && report.failed.is_empty() {
                println!("Nothing to install.");
            } else if report.failed.is_empty() {
                println!("✓ Installed {} extensions", report.installed.len());
            } else {
                println!(
                    "Installed {} extensions, {} failed:",
                    report.installed.len(),
                    report.failed.len()
                );
                for (id, reason) in &report.failed {
                    println!("  {} ({})", id, reason);
                }
            }
        }
    }

    Ok(())
}
