//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Build an engine from the context
//!   2. Drive it through an `AvatarSession`
//!   3. Format output for the terminal
//!
//! Handlers should NOT:
//! - Pick or construct speech backends
//! - Touch engine internals beyond the session surface

pub mod interactive;
pub mod say;
pub mod voices;

use lipsync_core::AvatarEvent;
use lipsync_voice::IgnoreReason;

/// User-facing text for an ignored speak request.
pub(crate) const fn describe_ignore(reason: IgnoreReason) -> &'static str {
    match reason {
        IgnoreReason::EmptyText => "nothing to say",
        IgnoreReason::AlreadySpeaking => "still speaking",
    }
}

/// Log an engine event; failures are also shown to the user.
pub(crate) fn report_event(event: &AvatarEvent) {
    match event {
        AvatarEvent::SpeechFailed { utterance_id, error } => {
            eprintln!("Speech failed ({utterance_id}): {error}");
        }
        other => tracing::debug!(event = ?other, "Avatar event"),
    }
}
