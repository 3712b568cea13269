//! extsync - sync editor extensions and settings through GitHub
//!
//! This library provides the pieces behind the `extsync` CLI: OAuth login
//! and credential storage, a sha-aware wrapper over the GitHub contents
//! API, and the operations that upload or restore the extension list and
//! settings files.

pub mod cli;
pub mod core;
pub mod error;
pub mod github;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::{ExtsyncError, Result};
