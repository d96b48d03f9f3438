//! Engine error types.

use lipsync_core::{SettingsError, SpeechError};

/// Errors that can occur while constructing the engine or a speech backend.
///
/// Failures during speech itself never surface here; the controller absorbs
/// them and reports through the event emitter.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Timers and backends need a tokio runtime to spawn onto.
    #[error("No tokio runtime available; create the engine inside a runtime")]
    NoRuntime,

    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// The requested speech backend cannot be used on this machine.
    #[error("Speech backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Error reported by a speech service during setup.
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

/// Grab the current tokio runtime handle.
pub(crate) fn current_runtime() -> Result<tokio::runtime::Handle, VoiceError> {
    tokio::runtime::Handle::try_current().map_err(|_| VoiceError::NoRuntime)
}
