//! Sync repository coordinates
//!
//! The sync repository is configured as a single "owner/repo" string. This
//! module parses it and resolves it from the configuration snapshot,
//! prompting the user once when it has never been set.

use std::fmt;
use std::str::FromStr;

use crate::core::config::{Config, ConfigSink};
use crate::core::prompt::Prompter;
use crate::error::{ExtsyncError, Result};

/// Repository coordinate containing owner and repo name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinate {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryCoordinate {
    /// Parse an "owner/repo" string
    ///
    /// Splits on the first `/`; both halves must be non-empty and the
    /// repository half may not contain another `/`.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let invalid = || ExtsyncError::InvalidRepository(value.to_string());

        let (owner, name) = trimmed.split_once('/').ok_or_else(invalid)?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Get the full repository name (owner/name)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Get the GitHub URL for this repository
    pub fn github_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryCoordinate {
    type Err = ExtsyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolve the sync repository from the configuration snapshot
///
/// When no repository is configured, the user is asked for one; the answer
/// is validated, stored in the snapshot and persisted through `sink`. An
/// existing value is never replaced here.
pub fn resolve_repository(
    config: &mut Config,
    prompter: &dyn Prompter,
    sink: &dyn ConfigSink,
) -> Result<RepositoryCoordinate> {
    if let Some(existing) = config.repository.as_deref() {
        return RepositoryCoordinate::parse(existing);
    }

    let answer = prompter
        .input("GitHub repository to sync with (owner/repo):")?
        .ok_or(ExtsyncError::Cancelled)?;
    let coordinate = RepositoryCoordinate::parse(&answer)?;

    config.repository = Some(coordinate.full_name());
    sink.persist(config)?;
    tracing::debug!("Sync repository set to {}", coordinate);

    Ok(coordinate)
}

/// Replace the configured repository (the explicit "change repository" action)
pub fn change_repository(
    config: &mut Config,
    value: &str,
    sink: &dyn ConfigSink,
) -> Result<RepositoryCoordinate> {
    let coordinate = RepositoryCoordinate::parse(value)?;
    config.repository = Some(coordinate.full_name());
    sink.persist(config)?;
    Ok(coordinate)
}
