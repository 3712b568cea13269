//! CLI command definitions using clap
//!
//! Defines the command structure for the `extsync` CLI tool.

use clap::{Parser, Subcommand, ValueEnum};

/// extsync - back up editor extensions and settings to GitHub
///
/// Snapshots installed extensions and settings into a GitHub repository
/// you own, and restores them on another machine.
#[derive(Parser, Debug)]
#[command(name = "extsync", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with GitHub
    Auth(AuthArgs),

    /// Choose the sync repository
    Repo(RepoArgs),

    /// Sync or import installed extensions
    Extensions(ExtensionsArgs),

    /// Sync or import editor settings
    Settings(SettingsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Login to GitHub through your OAuth app
    Login,
    /// Logout and remove stored credentials
    Logout,
    /// Show current authentication status
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Repo Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Repository commands
#[derive(Parser, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Change the sync repository
    Set {
        /// Repository as owner/repo (asked for when omitted)
        repository: Option<String>,
    },
    /// Show the sync repository
    Show,
}

// ─────────────────────────────────────────────────────────────────────────────
// Extensions Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Extension commands
#[derive(Parser, Debug)]
pub struct ExtensionsArgs {
    #[command(subcommand)]
    pub command: ExtensionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExtensionsCommand {
    /// Upload the list of installed extensions
    Sync,
    /// Install extensions from the uploaded list
    Import {
        /// Install every extension without asking
        #[arg(long)]
        all: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Settings commands
#[derive(Parser, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Upload settings.json (and remote-server settings, if present)
    Sync,
    /// Overwrite local settings with the uploaded copies
    Import,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Remove a configuration value
    Remove {
        /// Configuration key
        key: ConfigKey,
    },

    /// Show the configuration file location
    Path,
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Sync repository (owner/repo)
    #[value(name = "repository")]
    Repository,

    /// File name of the extension list
    #[value(name = "file-name")]
    FileName,

    /// OAuth app client ID
    #[value(name = "client-id")]
    ClientId,

    /// OAuth app client secret
    #[value(name = "client-secret")]
    ClientSecret,

    /// Editor launcher command
    #[value(name = "editor-command")]
    EditorCommand,

    /// Installed extensions directory
    #[value(name = "extensions-dir")]
    ExtensionsDir,

    /// User settings file
    #[value(name = "settings-path")]
    SettingsPath,

    /// Remote-server settings file
    #[value(name = "remote-settings-path")]
    RemoteSettingsPath,
}
