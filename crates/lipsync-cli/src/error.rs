//! CLI-specific error types and exit codes.

use lipsync_core::SettingsError;
use lipsync_voice::VoiceError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine failure.
    #[error("{0}")]
    Engine(String),

    /// Argument error not caught by clap.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (terminal, stdin).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested speech backend cannot be used.
    #[error("Speech backend error: {0}")]
    Backend(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions (see sysexits.h):
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 69: Service unavailable
    /// - 74: IO error
    /// - 78: Configuration error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Backend(_) => 69,  // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidSettings(e) => Self::Config(e.to_string()),
            VoiceError::BackendUnavailable(msg) => Self::Backend(msg),
            VoiceError::Speech(e) => Self::Backend(e.to_string()),
            e @ VoiceError::NoRuntime => Self::Engine(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(CliError::Backend("x".into()).exit_code(), 69);
        assert_eq!(CliError::Io("x".into()).exit_code(), 74);
    }

    #[test]
    fn voice_errors_map_to_categories() {
        let unavailable: CliError =
            VoiceError::BackendUnavailable("espeak-ng not found".into()).into();
        assert_eq!(unavailable.exit_code(), 69);

        let invalid: CliError = VoiceError::InvalidSettings(SettingsError::ZeroTickBase).into();
        assert!(matches!(invalid, CliError::Config(_)));
    }
}
