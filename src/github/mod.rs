//! GitHub API integration module
//!
//! This module provides all GitHub-related functionality:
//! - OAuth authorization-code login
//! - Authenticated client and identity lookup
//! - Repository contents read/write
//! - Error classification

pub mod auth;
pub mod client;
pub mod contents;
pub mod error_handler;

pub use auth::{AuthorizationMachine, CodeExchange, OAuthApp, OAuthFlow};
pub use client::{GitHubClient, GitHubUser};
pub use contents::{ContentsApi, RemoteFileSync, UpsertKind, UpsertOutcome};
pub use error_handler::classify_github_error;
