//! Platform speech service port.
//!
//! # Design Rules
//!
//! - The port is deliberately narrow: submit, cancel, list voices, and
//!   subscribe to voice-list changes. Nothing about audio devices, processes
//!   or timers leaks through it.
//! - Start/end/error notifications flow back through [`UtteranceCallbacks`],
//!   which is tagged with the [`UtteranceId`] of the request it belongs to.
//! - Implementations may invoke callbacks synchronously from inside
//!   [`SpeechSynthesisPort::speak`] or [`SpeechSynthesisPort::cancel`];
//!   callers must not hold their own locks across those calls.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{UtteranceId, UtteranceRequest, Voice};

/// Errors reported by a speech service.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The engine failed while producing or playing audio.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// The utterance was cut short by a cancel request.
    #[error("Utterance interrupted")]
    Interrupted,

    /// The service could not accept the request at all.
    #[error("Speech service unavailable: {0}")]
    Unavailable(String),

    /// IO error talking to the engine (process spawn, pipes).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receiver of lifecycle notifications for submitted utterances.
///
/// Implemented by the speech controller. Every method receives the id of the
/// utterance the notification is about.
pub trait UtteranceObserver: Send + Sync {
    /// The platform started voicing the utterance.
    fn on_start(&self, id: UtteranceId);

    /// The utterance finished playing.
    fn on_end(&self, id: UtteranceId);

    /// The utterance failed or was interrupted.
    fn on_error(&self, id: UtteranceId, error: SpeechError);
}

/// Callback handle given to the platform with each request.
///
/// Cheap to clone; every clone reports against the same utterance id.
#[derive(Clone)]
pub struct UtteranceCallbacks {
    id: UtteranceId,
    observer: Arc<dyn UtteranceObserver>,
}

impl UtteranceCallbacks {
    pub fn new(id: UtteranceId, observer: Arc<dyn UtteranceObserver>) -> Self {
        Self { id, observer }
    }

    /// Id of the utterance these callbacks report on.
    #[must_use]
    pub const fn id(&self) -> UtteranceId {
        self.id
    }

    pub fn started(&self) {
        self.observer.on_start(self.id);
    }

    pub fn ended(&self) {
        self.observer.on_end(self.id);
    }

    pub fn failed(&self, error: SpeechError) {
        self.observer.on_error(self.id, error);
    }
}

impl fmt::Debug for UtteranceCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtteranceCallbacks")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Invoked whenever the platform's voice list changes.
pub type VoicesChangedCallback = Arc<dyn Fn() + Send + Sync>;

/// Backend-agnostic text-to-speech service.
///
/// Implementations must be `Send + Sync` so the controller can share them
/// with callbacks running on the async runtime.
pub trait SpeechSynthesisPort: Send + Sync {
    /// Submit a request for playback.
    ///
    /// Returning `Err` means the request was never accepted; no callbacks
    /// will fire for it. After `Ok`, exactly one of `ended`/`failed` should
    /// eventually fire, preceded by `started` when playback actually began.
    fn speak(
        &self,
        request: UtteranceRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<(), SpeechError>;

    /// Cancel everything pending or playing. Safe to call when idle.
    fn cancel(&self);

    /// Currently available voices. May be empty while the list is loading.
    fn voices(&self) -> Vec<Voice>;

    /// Register a callback fired when [`voices`](Self::voices) changes.
    fn subscribe_voices_changed(&self, callback: VoicesChangedCallback);
}
