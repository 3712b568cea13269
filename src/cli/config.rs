//! Configuration CLI command handlers

use std::path::PathBuf;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::{Config, DEFAULT_EDITOR_COMMAND, DEFAULT_FILE_NAME};
use crate::core::repository::RepositoryCoordinate;
use crate::error::{ExtsyncError, Result};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(key, value),
        ConfigCommand::Get { key } => handle_get(key),
        ConfigCommand::Remove { key } => handle_remove(key),
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

/// Handle setting a configuration value
fn handle_set(key: ConfigKey, value: String) -> Result<()> {
    let mut config = Config::load()?;
    apply_set(&mut config, key, value)?;
    config.save()?;
    println!("{} has been updated.", display_name(key));
    Ok(())
}

/// Handle getting a configuration value
fn handle_get(key: ConfigKey) -> Result<()> {
    let config = Config::load()?;
    println!(
        "{}: {}",
        display_name(key),
        current_value(&config, key).unwrap_or_else(|| "Not configured".to_string())
    );
    Ok(())
}

/// Handle removing a configuration value
fn handle_remove(key: ConfigKey) -> Result<()> {
    let mut config = Config::load()?;
    apply_remove(&mut config, key);
    config.save()?;
    println!("{} has been removed.", display_name(key));
    Ok(())
}

fn display_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Repository => "Repository",
        ConfigKey::FileName => "Extension list file",
        ConfigKey::ClientId => "OAuth client ID",
        ConfigKey::ClientSecret => "OAuth client secret",
        ConfigKey::EditorCommand => "Editor command",
        ConfigKey::ExtensionsDir => "Extensions directory",
        ConfigKey::SettingsPath => "Settings path",
        ConfigKey::RemoteSettingsPath => "Remote settings path",
    }
}

fn apply_set(config: &mut Config, key: ConfigKey, value: String) -> Result<()> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ExtsyncError::InvalidInput(format!(
            "{} cannot be empty",
            display_name(key)
        )));
    }

    match key {
        ConfigKey::Repository => {
            config.repository = Some(RepositoryCoordinate::parse(&value)?.full_name());
        }
        ConfigKey::FileName => {
            if value.contains('/') || value.contains('\\') {
                return Err(ExtsyncError::InvalidInput(format!(
                    "'{}' must be a plain file name",
                    value
                )));
            }
            config.file_name = value;
        }
        ConfigKey::ClientId => config.client_id = Some(value),
        ConfigKey::ClientSecret => config.client_secret = Some(value),
        ConfigKey::EditorCommand => config.editor_command = value,
        ConfigKey::ExtensionsDir => config.extensions_dir = Some(PathBuf::from(value)),
        ConfigKey::SettingsPath => config.settings_path = Some(PathBuf::from(value)),
        ConfigKey::RemoteSettingsPath => {
            config.remote_settings_path = Some(PathBuf::from(value))
        }
    }
    Ok(())
}

fn apply_remove(config: &mut Config, key: ConfigKey) {
    match key {
        ConfigKey::Repository => config.repository = None,
        ConfigKey::FileName => config.file_name = DEFAULT_FILE_NAME.to_string(),
        ConfigKey::ClientId => config.client_id = None,
        ConfigKey::ClientSecret => config.client_secret = None,
        ConfigKey::EditorCommand => config.editor_command = DEFAULT_EDITOR_COMMAND.to_string(),
        ConfigKey::ExtensionsDir => config.extensions_dir = None,
        ConfigKey::SettingsPath => config.settings_path = None,
        ConfigKey::RemoteSettingsPath => config.remote_settings_path = None,
    }
}

fn current_value(config: &Config, key: ConfigKey) -> Option<String> {
    match key {
        ConfigKey::Repository => config.repository.clone(),
        ConfigKey::FileName => Some(config.file_name.clone()),
        ConfigKey::ClientId => config.client_id.clone(),
        ConfigKey::ClientSecret => config.client_secret.as_deref().map(mask_secret),
        ConfigKey::EditorCommand => Some(config.editor_command.clone()),
        ConfigKey::ExtensionsDir => config
            .extensions_dir
            .as_ref()
            .map(|p| p.display().to_string()),
        ConfigKey::SettingsPath => config
            .settings_path
            .as_ref()
            .map(|p| p.display().to_string()),
        ConfigKey::RemoteSettingsPath => config
            .remote_settings_path
            .as_ref()
            .map(|p| p.display().to_string()),
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
