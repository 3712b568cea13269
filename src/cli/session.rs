//! Shared setup for commands that talk to the sync repository

use crate::core::config::{Config, FileConfigSink};
use crate::core::credentials::{Credential, CredentialStore};
use crate::core::prompt::Prompter;
use crate::core::repository::RepositoryCoordinate;
use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::sync::orchestrator::resolve_session;

/// Everything a sync command needs once the user is known
pub struct Session {
    pub config: Config,
    pub credential: Credential,
    pub repo: RepositoryCoordinate,
    pub client: GitHubClient,
}

impl Session {
    /// Load config, require a login and resolve the repository
    pub fn open(prompter: &dyn Prompter) -> Result<Self> {
        let mut config = Config::load()?;
        let sink = FileConfigSink::new()?;
        let store = CredentialStore::keyring();

        let (credential, repo) = resolve_session(&mut config, &store, prompter, &sink)?;
        let client = GitHubClient::new(&credential.access_token)?;

        tracing::debug!(
            "Session for @{} against {}",
            credential.login(),
            repo.full_name()
        );

        Ok(Self {
            config,
            credential,
            repo,
            client,
        })
    }
}
