//! Configuration resolution.
//!
//! Layers, lowest precedence first:
//! 1. [`AvatarSettings::default`]
//! 2. JSON settings file (`--config`)
//! 3. Environment (`LIPSYNC_*`, `.env`) and command-line flags
//!
//! Layer 3 is handled by clap: an explicit flag beats its environment
//! variable. The merged settings are validated before anything is built.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use lipsync_core::{AvatarSettings, validate_settings};

use crate::error::CliError;
use crate::parser::Cli;

/// Which speech backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// espeak-ng if installed, else simulated
    #[default]
    Auto,
    /// Timer-driven, silent
    Simulated,
    /// espeak-ng command-line tool
    Espeak,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Simulated => "simulated",
            Self::Espeak => "espeak",
        })
    }
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub settings: AvatarSettings,
    pub backend: BackendKind,
}

impl CliConfig {
    /// Merge file, environment and flags over the defaults.
    pub fn resolve(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = match &cli.config {
            Some(path) => load_settings_file(path)?,
            None => AvatarSettings::default(),
        };

        if let Some(rate) = cli.rate {
            settings.rate = rate;
        }
        if let Some(pitch) = cli.pitch {
            settings.pitch = pitch;
        }
        if let Some(volume) = cli.volume {
            settings.volume = volume;
        }
        if let Some(locale) = &cli.locale {
            settings.preferred_locale.clone_from(locale);
        }

        validate_settings(&settings)?;

        let config = Self {
            settings,
            backend: cli.backend.unwrap_or_default(),
        };
        tracing::debug!(?config, "Configuration resolved");
        Ok(config)
    }
}

/// Read settings from a JSON file. Missing fields keep their defaults.
pub fn load_settings_file(path: &Path) -> Result<AvatarSettings, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Config(format!("invalid settings in {}: {e}", path.display())))
}

/// Load `.env` from the working directory if present.
///
/// Returns the file that was loaded. Runs before tracing is installed, so the
/// caller logs the outcome.
pub fn load_dotenv() -> Result<Option<PathBuf>, CliError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(CliError::Config(format!("invalid .env file: {e}"))),
    }
}
