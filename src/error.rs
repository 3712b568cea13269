//! Custom error types for extsync
//!
//! User-friendly error messages for all failure scenarios.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the extsync application
#[derive(Error, Debug)]
pub enum ExtsyncError {
    /// A required configuration value is not set and could not be obtained
    #[error("Missing configuration: {0}\n\n  → Run 'extsync config set {0} <value>' to set it.")]
    ConfigurationMissing(String),

    /// User is not authenticated
    #[error("You are not logged in to GitHub.\n\n  → Run 'extsync auth login' to authenticate.")]
    NotAuthenticated,

    /// Authentication process failed
    #[error("GitHub authentication failed: {0}\n\n  → Try running 'extsync auth login' again.")]
    AuthenticationFailed(String),

    /// The requested file does not exist in the sync repository
    #[error("'{path}' was not found in '{repository}'.\n\n  → Nothing has been synced under that name yet. Run a sync command first (e.g. 'extsync extensions sync').")]
    RemoteNotFound { repository: String, path: String },

    /// Any other non-success response from GitHub
    #[error("GitHub API request failed{}: {message}\n\n  → Check your internet connection and repository permissions.", status_suffix(.status))]
    GitHubApi {
        /// HTTP status, when the failure came from a response
        status: Option<u16>,
        /// Message reported by GitHub or the transport
        message: String,
    },

    /// Repository coordinate is not of the form owner/repo
    #[error("Invalid repository '{0}'.\n\n  → Expected format: owner/repo (e.g. octocat/editor-sync)")]
    InvalidRepository(String),

    /// A local file that must exist is missing
    #[error("Local file not found: {}\n\n  → Check the path, or override it with 'extsync config set'.", .0.display())]
    LocalFileMissing(PathBuf),

    /// Installing an extension through the editor failed
    #[error("Failed to install '{id}': {reason}")]
    InstallFailed { id: String, reason: String },

    /// Credential storage error
    #[error("Cannot access secure storage: {0}\n\n  → On macOS: Make sure Keychain Access is available.\n  → On Linux: Ensure a secret service (like gnome-keyring) is running.")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Operation cancelled by user
    #[error("Operation cancelled.")]
    Cancelled,
}

impl ExtsyncError {
    /// Whether this error reports a missing remote file
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExtsyncError::RemoteNotFound { .. })
    }
}

impl From<keyring::Error> for ExtsyncError {
    fn from(err: keyring::Error) -> Self {
        ExtsyncError::Credential(err.to_string())
    }
}

impl From<toml::de::Error> for ExtsyncError {
    fn from(err: toml::de::Error) -> Self {
        ExtsyncError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for ExtsyncError {
    fn from(err: toml::ser::Error) -> Self {
        ExtsyncError::Toml(err.to_string())
    }
}

impl From<octocrab::Error> for ExtsyncError {
    fn from(err: octocrab::Error) -> Self {
        // Use the error handler to classify by status code
        crate::github::error_handler::classify_github_error(err)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Result type alias using ExtsyncError
pub type Result<T> = std::result::Result<T, ExtsyncError>;
