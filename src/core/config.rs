//! Application configuration management
//!
//! Handles loading and saving application settings including:
//! - The sync repository and extension list file name
//! - OAuth app credentials
//! - Editor path overrides
//!
//! A `Config` is loaded once per command and passed down as a snapshot.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ExtsyncError, Result};

/// Default name of the extension list file in the sync repository
pub const DEFAULT_FILE_NAME: &str = "extensions.json";

/// Default editor launcher command
pub const DEFAULT_EDITOR_COMMAND: &str = "code";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sync repository as "owner/repo"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// File name used for the extension list
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// OAuth app client ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth app client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Editor launcher used for version lookup and installs
    #[serde(default = "default_editor_command")]
    pub editor_command: String,

    /// Override for the installed extensions directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions_dir: Option<PathBuf>,

    /// Override for the user settings file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<PathBuf>,

    /// Override for the remote-server settings file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_settings_path: Option<PathBuf>,
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_editor_command() -> String {
    DEFAULT_EDITOR_COMMAND.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: None,
            file_name: default_file_name(),
            client_id: None,
            client_secret: None,
            editor_command: default_editor_command(),
            extensions_dir: None,
            settings_path: None,
            remote_settings_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "extsync", "extsync")
            .ok_or_else(|| ExtsyncError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    /// Both halves of the OAuth app registration, if configured
    pub fn oauth_app(&self) -> Option<(String, String)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

/// Persists configuration changes made while a command runs
///
/// Commands work on a snapshot; the sink writes back the few values that
/// are captured interactively (repository, OAuth app).
pub trait ConfigSink: Send + Sync {
    /// Write the updated snapshot
    fn persist(&self, config: &Config) -> Result<()>;
}

/// Sink writing to the user's configuration file
pub struct FileConfigSink {
    path: PathBuf,
}

impl FileConfigSink {
    /// Sink for the default configuration file
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: Config::config_path()?,
        })
    }

    /// Sink for a specific file
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigSink for FileConfigSink {
    fn persist(&self, config: &Config) -> Result<()> {
        config.save_to(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.file_name, "extensions.json");
        assert_eq!(config.editor_command, "code");
        assert!(config.repository.is_none());
        assert!(config.oauth_app().is_none());
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str("repository = \"alice/my-exts\"\n").unwrap();
        assert_eq!(config.repository.as_deref(), Some("alice/my-exts"));
        assert_eq!(config.file_name, "extensions.json");
    }

    #[test]
    fn test_oauth_app_requires_both_halves() {
        let mut config = Config {
            client_id: Some("id".to_string()),
            ..Config::default()
        };
        assert!(config.oauth_app().is_none());

        config.client_secret = Some(String::new());
        assert!(config.oauth_app().is_none());

        config.client_secret = Some("secret".to_string());
        assert_eq!(
            config.oauth_app(),
            Some(("id".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_file_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            repository: Some("alice/my-exts".to_string()),
            client_id: Some("abc".to_string()),
            ..Config::default()
        };

        FileConfigSink::at(path.clone()).persist(&config).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
