//! Local settings files
//!
//! The primary file is the editor's user `settings.json`. When the editor
//! runs against a remote server, the server keeps its own machine settings,
//! which are synced as a second, independent file.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::core::config::Config;
use crate::error::{ExtsyncError, Result};

/// Remote name of the primary settings file
pub const SETTINGS_FILE: &str = "settings.json";

/// Remote name of the remote-server settings file
pub const REMOTE_SETTINGS_FILE: &str = "remote-settings.json";

/// Where the settings files live on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLocation {
    /// User settings file
    pub settings_path: PathBuf,
    /// Remote-server settings file, when a server install is present
    pub remote_settings_path: Option<PathBuf>,
}

impl SettingsLocation {
    /// Resolve paths from configuration overrides and platform defaults
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = BaseDirs::new()
            .ok_or_else(|| ExtsyncError::Config("Could not determine home directory".into()))?;

        let settings_path = config
            .settings_path
            .clone()
            .unwrap_or_else(|| default_settings_path(base.config_dir()));

        let remote_settings_path = config
            .remote_settings_path
            .clone()
            .or_else(|| default_remote_settings_path(base.home_dir()));

        Ok(Self {
            settings_path,
            remote_settings_path,
        })
    }

    /// Read the primary settings file
    pub fn read_settings(&self) -> Result<Vec<u8>> {
        if !self.settings_path.is_file() {
            return Err(ExtsyncError::LocalFileMissing(self.settings_path.clone()));
        }
        Ok(fs::read(&self.settings_path)?)
    }

    /// Read the remote-server settings file, if there is one
    pub fn read_remote_settings(&self) -> Result<Option<Vec<u8>>> {
        match &self.remote_settings_path {
            Some(path) if path.is_file() => Ok(Some(fs::read(path)?)),
            _ => Ok(None),
        }
    }

    /// Overwrite the primary settings file
    pub fn write_settings(&self, content: &[u8]) -> Result<()> {
        write_file(&self.settings_path, content)
    }

    /// Overwrite the remote-server settings file
    ///
    /// Returns the path written, or `None` when no remote location is known.
    pub fn write_remote_settings(&self, content: &[u8]) -> Result<Option<PathBuf>> {
        match &self.remote_settings_path {
            Some(path) => {
                write_file(path, content)?;
                Ok(Some(path.clone()))
            }
            None => Ok(None),
        }
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// `<config dir>/Code/User/settings.json`
///
/// The platform config dir is `~/.config` on Linux, `~/Library/Application
/// Support` on macOS and `%APPDATA%` on Windows.
fn default_settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("Code").join("User").join("settings.json")
}

/// Machine settings of a VS Code server install, if one exists
fn default_remote_settings_path(home: &Path) -> Option<PathBuf> {
    let server = home.join(".vscode-server");
    server
        .is_dir()
        .then(|| server.join("data").join("Machine").join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert_eq!(
            default_settings_path(Path::new("/home/a/.config")),
            PathBuf::from("/home/a/.config/Code/User/settings.json")
        );

        let home = tempfile::tempdir().unwrap();
        assert!(default_remote_settings_path(home.path()).is_none());

        fs::create_dir_all(home.path().join(".vscode-server")).unwrap();
        assert_eq!(
            default_remote_settings_path(home.path()),
            Some(
                home.path()
                    .join(".vscode-server/data/Machine/settings.json")
            )
        );
    }

    #[test]
    fn test_overrides_win() {
        let config = Config {
            settings_path: Some(PathBuf::from("/tmp/s.json")),
            remote_settings_path: Some(PathBuf::from("/tmp/r.json")),
            ..Config::default()
        };
        let location = SettingsLocation::from_config(&config).unwrap();
        assert_eq!(location.settings_path, PathBuf::from("/tmp/s.json"));
        assert_eq!(
            location.remote_settings_path,
            Some(PathBuf::from("/tmp/r.json"))
        );
    }

    #[test]
    fn test_missing_primary_is_local_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = SettingsLocation {
            settings_path: dir.path().join("settings.json"),
            remote_settings_path: None,
        };
        assert!(matches!(
            location.read_settings(),
            Err(ExtsyncError::LocalFileMissing(_))
        ));
        assert!(location.read_remote_settings().unwrap().is_none());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let location = SettingsLocation {
            settings_path: dir.path().join("User").join("settings.json"),
            remote_settings_path: Some(dir.path().join("Machine").join("settings.json")),
        };

        location.write_settings(b"{\"a\":1}").unwrap();
        assert_eq!(location.read_settings().unwrap(), b"{\"a\":1}");

        let written = location.write_remote_settings(b"{}").unwrap();
        assert_eq!(written, location.remote_settings_path);
        assert_eq!(location.read_remote_settings().unwrap().unwrap(), b"{}");
    }
}
