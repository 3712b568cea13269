//! Extension and settings sync
//!
//! - Snapshot of installed extensions and the editor host
//! - Local settings file locations
//! - The sync and import operations

pub mod extensions;
pub mod orchestrator;
pub mod settings;

pub use extensions::{ExtensionEntry, ExtensionHost, ExtensionSnapshot, VsCodeHost};
pub use orchestrator::SyncOrchestrator;
pub use settings::SettingsLocation;
