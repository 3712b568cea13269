//! CLI module for extsync
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod auth;
pub mod commands;
pub mod config;
pub mod extensions;
pub mod repo;
pub mod session;
pub mod settings;

pub use commands::{Cli, Commands};
