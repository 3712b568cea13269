//! Installed extension discovery and installation
//!
//! The editor is reached through the `ExtensionHost` trait. `VsCodeHost`
//! reads the extensions directory directly (one folder per installed
//! extension, each with a `package.json`) and uses the editor's command-line
//! launcher for the version string and for installs.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::BaseDirs;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::core::config::Config;
use crate::error::{ExtsyncError, Result};

/// Marketplace id pattern: `publisher.name`
static EXTENSION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*\.[A-Za-z0-9][A-Za-z0-9_.-]*$")
        .expect("Invalid regex pattern for extension ids")
});

/// One extension in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    /// Marketplace id (`publisher.name`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Installed version
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExtensionEntry {
    /// Line shown in the import picker
    pub fn label(&self) -> String {
        if self.name == self.id {
            format!("{} v{}", self.id, self.version)
        } else {
            format!("{} ({}) v{}", self.name, self.id, self.version)
        }
    }
}

/// Point-in-time list of installed extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSnapshot {
    pub extensions: Vec<ExtensionEntry>,
    pub last_updated: DateTime<Utc>,
    pub host_version: String,
}

impl ExtensionSnapshot {
    /// Snapshot `extensions` as of now
    pub fn new(extensions: Vec<ExtensionEntry>, host_version: String) -> Self {
        Self {
            extensions,
            last_updated: Utc::now(),
            host_version,
        }
    }

    /// Serialize to the JSON stored in the sync repository
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot previously written by `to_json`
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Check that `id` looks like a marketplace id
pub fn is_valid_extension_id(id: &str) -> bool {
    EXTENSION_ID_PATTERN.is_match(id)
}

/// The editor as seen by the sync operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Installed, non-built-in extensions in a stable order
    async fn installed_extensions(&self) -> Result<Vec<ExtensionEntry>>;
    /// Editor version string
    async fn host_version(&self) -> Result<String>;
    /// Install an extension by marketplace id
    async fn install(&self, id: &str) -> Result<()>;
}

/// `package.json` fields we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    publisher: String,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    version: String,
    #[serde(default)]
    description: Option<String>,
}

/// Visual Studio Code on this machine
pub struct VsCodeHost {
    command: String,
    extensions_dir: PathBuf,
}

impl VsCodeHost {
    /// Host with explicit launcher and extensions directory
    pub fn new(command: impl Into<String>, extensions_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            extensions_dir,
        }
    }

    /// Host described by the configuration snapshot
    pub fn from_config(config: &Config) -> Result<Self> {
        let extensions_dir = match &config.extensions_dir {
            Some(dir) => dir.clone(),
            None => default_extensions_dir()?,
        };
        Ok(Self::new(config.editor_command.clone(), extensions_dir))
    }

    /// Directory scanned for installed extensions
    pub fn extensions_dir(&self) -> &Path {
        &self.extensions_dir
    }

    /// Folder names the editor has marked for removal
    fn obsolete_folders(&self) -> HashSet<String> {
        let path = self.extensions_dir.join(".obsolete");
        fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<BTreeMap<String, bool>>(&text).ok())
            .map(|map| {
                map.into_iter()
                    .filter(|(_, obsolete)| *obsolete)
                    .map(|(folder, _)| folder)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Read every extension folder, keeping the newest version of each id
    pub fn scan(&self) -> Result<Vec<ExtensionEntry>> {
        if !self.extensions_dir.is_dir() {
            return Err(ExtsyncError::LocalFileMissing(self.extensions_dir.clone()));
        }

        let obsolete = self.obsolete_folders();
        let mut by_id: BTreeMap<String, ExtensionEntry> = BTreeMap::new();

        for dir_entry in fs::read_dir(&self.extensions_dir)? {
            let dir_entry = dir_entry?;
            let folder = dir_entry.file_name().to_string_lossy().to_string();
            if folder.starts_with('.') || obsolete.contains(&folder) {
                continue;
            }

            let manifest_path = dir_entry.path().join("package.json");
            let Ok(text) = fs::read_to_string(&manifest_path) else {
                continue;
            };
            let manifest: PackageManifest = match serde_json::from_str(&text) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", manifest_path.display(), e);
                    continue;
                }
            };

            let entry = ExtensionEntry {
                id: format!("{}.{}", manifest.publisher, manifest.name),
                name: manifest
                    .display_name
                    .filter(|n| !n.is_empty() && !n.starts_with('%'))
                    .unwrap_or_else(|| manifest.name.clone()),
                version: manifest.version,
                description: manifest
                    .description
                    .filter(|d| !d.is_empty() && !d.starts_with('%')),
            };

            let key = entry.id.to_lowercase();
            match by_id.get(&key) {
                Some(existing) if version_key(&existing.version) >= version_key(&entry.version) => {}
                _ => {
                    by_id.insert(key, entry);
                }
            }
        }

        Ok(by_id.into_values().collect())
    }
}

/// Numeric components of a version, for ordering
fn version_key(version: &str) -> Vec<u64> {
    version
        .split(['.', '-', '+'])
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

fn default_extensions_dir() -> Result<PathBuf> {
    let base = BaseDirs::new()
        .ok_or_else(|| ExtsyncError::Config("Could not determine home directory".into()))?;
    Ok(base.home_dir().join(".vscode").join("extensions"))
}

#[async_trait]
impl ExtensionHost for VsCodeHost {
    async fn installed_extensions(&self) -> Result<Vec<ExtensionEntry>> {
        self.scan()
    }

    async fn host_version(&self) -> Result<String> {
        let output = Command::new(&self.command).arg("--version").output().await;

        let version = match output {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            Ok(output) => {
                tracing::debug!("'{} --version' exited with {}", self.command, output.status);
                None
            }
            Err(e) => {
                tracing::debug!("Cannot run '{}': {}", self.command, e);
                None
            }
        };

        Ok(version.unwrap_or_else(|| "unknown".to_string()))
    }

    async fn install(&self, id: &str) -> Result<()> {
        if !is_valid_extension_id(id) {
            return Err(ExtsyncError::InstallFailed {
                id: id.to_string(),
                reason: "not a valid extension id".to_string(),
            });
        }

        let output = Command::new(&self.command)
            .arg("--install-extension")
            .arg(id)
            .output()
            .await
            .map_err(|e| ExtsyncError::InstallFailed {
                id: id.to_string(),
                reason: format!("cannot run '{}': {}", self.command, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExtsyncError::InstallFailed {
                id: id.to_string(),
                reason: if stderr.is_empty() {
                    format!("'{}' exited with {}", self.command, output.status)
                } else {
                    stderr
                },
            });
        }

        Ok(())
    }
}
