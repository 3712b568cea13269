//! Core functionality for extsync
//!
//! This module contains shared business logic including:
//! - Application configuration
//! - Credential storage
//! - Interactive prompts
//! - Sync repository resolution

pub mod config;
pub mod credentials;
pub mod prompt;
pub mod repository;

pub use config::{Config, ConfigSink, FileConfigSink};
pub use credentials::{Credential, CredentialStore};
pub use prompt::{Prompter, TerminalPrompter};
pub use repository::RepositoryCoordinate;
