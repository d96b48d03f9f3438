//! Concrete speech services implementing [`SpeechSynthesisPort`].
//!
//! | Module        | Engine                     | Audio |
//! |---------------|----------------------------|-------|
//! | [`simulated`] | timer-driven, no audio     |       |
//! | [`espeak`]    | `espeak-ng` / `espeak` CLI |  ✓    |
//!
//! Both services play at most one utterance at a time. Submitting a new one
//! cancels the previous; a cancelled utterance reports
//! [`SpeechError::Interrupted`](lipsync_core::SpeechError::Interrupted).
//!
//! [`SpeechSynthesisPort`]: lipsync_core::SpeechSynthesisPort

pub mod espeak;
pub mod simulated;

pub use espeak::{EspeakConfig, EspeakSpeechService};
pub use simulated::{SimulatedConfig, SimulatedSpeechService};

use std::sync::{Mutex, PoisonError};

use lipsync_core::{UtteranceId, VoicesChangedCallback};
use tokio_util::sync::CancellationToken;

// ── Shared helpers ─────────────────────────────────────────────────

struct ActivePlayback {
    id: UtteranceId,
    token: CancellationToken,
}

/// Tracks the single utterance a service is currently voicing.
#[derive(Default)]
pub(crate) struct PlaybackSlot {
    active: Mutex<Option<ActivePlayback>>,
}

impl PlaybackSlot {
    /// Claim the slot for `id`, cancelling whatever held it.
    pub(crate) fn begin(&self, id: UtteranceId) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActivePlayback {
                id,
                token: token.clone(),
            });
        if let Some(previous) = previous {
            tracing::debug!(utterance_id = %previous.id, "Superseding active playback");
            previous.token.cancel();
        }
        token
    }

    /// Cancel the current playback, if any.
    pub(crate) fn cancel(&self) -> Option<UtteranceId> {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        previous.token.cancel();
        Some(previous.id)
    }

    /// Release the slot if `id` still holds it. Returns whether it did.
    pub(crate) fn finish(&self, id: UtteranceId) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|a| a.id == id) {
            *active = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn current(&self) -> Option<UtteranceId> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| a.id)
    }
}

/// Voices-changed subscribers.
#[derive(Default)]
pub(crate) struct VoiceListeners {
    callbacks: Mutex<Vec<VoicesChangedCallback>>,
}

impl VoiceListeners {
    pub(crate) fn push(&self, callback: VoicesChangedCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    /// Call every subscriber. The list lock is released first so callbacks
    /// may query the service.
    pub(crate) fn notify(&self) {
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in callbacks {
            callback();
        }
    }
}
