//! The four sync operations
//!
//! Each operation is a short, strictly sequential composition of a local
//! payload (extension snapshot or settings file) and `RemoteFileSync`.

use std::path::PathBuf;

use crate::core::config::{Config, ConfigSink};
use crate::core::credentials::{Credential, CredentialStore, SecretStorage};
use crate::core::prompt::Prompter;
use crate::core::repository::{resolve_repository, RepositoryCoordinate};
use crate::error::{ExtsyncError, Result};
use crate::github::contents::{ContentsApi, RemoteFileSync, UpsertOutcome};
use crate::sync::extensions::{ExtensionEntry, ExtensionHost, ExtensionSnapshot};
use crate::sync::settings::{SettingsLocation, REMOTE_SETTINGS_FILE, SETTINGS_FILE};

/// Resolve the credential and repository for one command
///
/// A missing credential fails immediately; a missing repository is asked
/// for and saved.
pub fn resolve_session<S: SecretStorage>(
    config: &mut Config,
    store: &CredentialStore<S>,
    prompter: &dyn Prompter,
    sink: &dyn ConfigSink,
) -> Result<(Credential, RepositoryCoordinate)> {
    let credential = store.require()?;
    let repo = resolve_repository(config, prompter, sink)?;
    Ok((credential, repo))
}

/// Result of `sync_extensions`
#[derive(Debug)]
pub struct ExtensionSyncReport {
    /// Number of extensions in the snapshot
    pub count: usize,
    /// Remote write result
    pub outcome: UpsertOutcome,
}

/// Progress of one install during `import_extensions`
#[derive(Debug)]
pub struct InstallProgress<'e> {
    /// 1-based position in the selection
    pub position: usize,
    /// Size of the selection
    pub total: usize,
    pub entry: &'e ExtensionEntry,
    /// Failure of this install, if any
    pub error: Option<&'e ExtsyncError>,
}

/// Result of `import_extensions`
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids installed successfully
    pub installed: Vec<String>,
    /// Ids that failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// What happened to the remote-server settings file
#[derive(Debug)]
pub enum SecondaryOutcome<T> {
    /// Nothing to do
    Skipped,
    /// Transferred
    Done(T),
    /// Failed without affecting the primary file
    Failed(ExtsyncError),
}

/// Result of `sync_settings`
#[derive(Debug)]
pub struct SettingsSyncReport {
    pub primary: UpsertOutcome,
    pub remote: SecondaryOutcome<UpsertOutcome>,
}

/// Result of `import_settings`
#[derive(Debug)]
pub struct SettingsImportReport {
    /// File overwritten with the synced settings
    pub primary: PathBuf,
    pub remote: SecondaryOutcome<PathBuf>,
}

/// Composes remote file sync with the local payloads
///
/// Only the extension operations need the editor; it is passed to them
/// directly so settings sync works without one.
pub struct SyncOrchestrator<'a> {
    remote: RemoteFileSync<'a>,
    prompter: &'a dyn Prompter,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        contents: &'a dyn ContentsApi,
        repo: RepositoryCoordinate,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            remote: RemoteFileSync::new(contents, repo),
            prompter,
        }
    }

    /// The repository being synced with
    pub fn repository(&self) -> &RepositoryCoordinate {
        self.remote.repository()
    }

    /// Upload a fresh snapshot of the installed extensions to `file_name`
    pub async fn sync_extensions(
        &self,
        host: &dyn ExtensionHost,
        file_name: &str,
    ) -> Result<ExtensionSyncReport> {
        let extensions = host.installed_extensions().await?;
        let host_version = host.host_version().await?;
        let snapshot = ExtensionSnapshot::new(extensions, host_version);

        let json = snapshot.to_json()?;
        let outcome = self.remote.upsert(json.as_bytes(), file_name).await?;

        Ok(ExtensionSyncReport {
            count: snapshot.extensions.len(),
            outcome,
        })
    }

    /// Install extensions chosen from the snapshot in `file_name`
    ///
    /// With `select_all` every entry is installed without asking. Installs
    /// run one at a time; a failed install is recorded and the rest continue.
    pub async fn import_extensions(
        &self,
        host: &dyn ExtensionHost,
        file_name: &str,
        select_all: bool,
        on_progress: &mut dyn FnMut(InstallProgress<'_>),
    ) -> Result<ImportReport> {
        let bytes = self.remote.fetch(file_name).await?;
        let snapshot = ExtensionSnapshot::from_json(&bytes)?;

        if snapshot.extensions.is_empty() {
            return Ok(ImportReport::default());
        }

        let selected: Vec<&ExtensionEntry> = if select_all {
            snapshot.extensions.iter().collect()
        } else {
            let labels: Vec<String> = snapshot.extensions.iter().map(|e| e.label()).collect();
            let indices = self
                .prompter
                .select_many("Extensions to install:", &labels)?
                .ok_or(ExtsyncError::Cancelled)?;
            indices
                .into_iter()
                .filter_map(|i| snapshot.extensions.get(i))
                .collect()
        };

        let total = selected.len();
        let mut report = ImportReport::default();

        for (i, entry) in selected.into_iter().enumerate() {
            let result = host.install(&entry.id).await;
            on_progress(InstallProgress {
                position: i + 1,
                total,
                entry,
                error: result.as_ref().err(),
            });

            match result {
                Ok(()) => report.installed.push(entry.id.clone()),
                Err(e) => {
                    tracing::warn!("Install of {} failed: {}", entry.id, e);
                    report.failed.push((entry.id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Upload the settings file, plus the remote-server settings if present
    pub async fn sync_settings(&self, location: &SettingsLocation) -> Result<SettingsSyncReport> {
        let settings = location.read_settings()?;
        let primary = self.remote.upsert(&settings, SETTINGS_FILE).await?;

        let remote = match location.read_remote_settings() {
            Ok(None) => SecondaryOutcome::Skipped,
            Ok(Some(content)) => match self.remote.upsert(&content, REMOTE_SETTINGS_FILE).await {
                Ok(outcome) => SecondaryOutcome::Done(outcome),
                Err(e) => SecondaryOutcome::Failed(e),
            },
            Err(e) => SecondaryOutcome::Failed(e),
        };

        Ok(SettingsSyncReport { primary, remote })
    }

    /// Overwrite local settings with the synced copies
    ///
    /// A missing remote-server file in the repository is not an error.
    pub async fn import_settings(&self, location: &SettingsLocation) -> Result<SettingsImportReport> {
        let settings = self.remote.fetch(SETTINGS_FILE).await?;
        location.write_settings(&settings)?;

        let remote = match self.remote.fetch_optional(REMOTE_SETTINGS_FILE).await {
            Ok(None) => SecondaryOutcome::Skipped,
            Ok(Some(content)) => match location.write_remote_settings(&content) {
                Ok(Some(path)) => SecondaryOutcome::Done(path),
                Ok(None) => {
                    tracing::debug!("No local remote-server settings path, skipping");
                    SecondaryOutcome::Skipped
                }
                Err(e) => SecondaryOutcome::Failed(e),
            },
            Err(e) => SecondaryOutcome::Failed(e),
        };

        Ok(SettingsImportReport {
            primary: location.settings_path.clone(),
            remote,
        })
    }
}
