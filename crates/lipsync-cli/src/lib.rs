//! # lipsync-cli
//!
//! Terminal front end and composition root for the lipsync talking avatar.
//!
//! `main.rs` parses arguments, resolves configuration, installs tracing and
//! hands a [`CliContext`] to the command handlers. Handlers drive an
//! [`AvatarSession`](lipsync_voice::AvatarSession) and render its frames with
//! the [`presentation`] helpers.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings; used by integration tests
#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use config::{BackendKind, CliConfig};
pub use error::CliError;
pub use parser::Cli;
