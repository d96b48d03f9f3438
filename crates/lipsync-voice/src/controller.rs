//! Speech controller: owns the lifecycle of a single utterance.
//!
//! The controller is the only writer of the speaking flag. Platform
//! notifications arrive through [`UtteranceCallbacks`] and are applied under
//! the controller's state lock, so at most one handler runs at a time.
//!
//! # Locking discipline
//!
//! The state lock is never held while calling into the speech service:
//! platforms may fire callbacks synchronously from `speak` or `cancel`, and
//! those callbacks take the same lock. Speaking-flag listeners *do* run under
//! the lock, which is what makes the scheduler reset atomic with the flag.
//!
//! Every utterance carries an id. Callbacks for an id that is no longer
//! current (a late start after `stop()`, the interruption error a platform
//! reports for a cancelled request) are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use lipsync_core::{
    AvatarEvent, AvatarEventEmitter, AvatarSettings, SpeechError, SpeechSynthesisPort,
    UtteranceCallbacks, UtteranceId, UtteranceObserver, UtteranceRequest, Voice,
};

use crate::selection::{VoiceChoice, choose_voice};
use crate::speaking::{SpeakingSignal, SpeakingWriter, speaking_signal};

// ── Outcomes ───────────────────────────────────────────────────────

/// Why a `speak` request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Text was empty or whitespace-only.
    EmptyText,

    /// An utterance is already being voiced; requests are not queued.
    AlreadySpeaking,
}

/// What happened to a `speak` request.
///
/// Purely informational: failures are absorbed by the controller and
/// reported through the event emitter, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Handed to the speech service; progress is observed via the speaking
    /// signal.
    Submitted(UtteranceId),

    /// Dropped by a precondition. No state changed.
    Ignored(IgnoreReason),

    /// The service refused the request. The controller is idle again.
    Failed {
        utterance_id: UtteranceId,
        error: String,
    },
}

impl SpeakOutcome {
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }

    #[must_use]
    pub const fn utterance_id(&self) -> Option<UtteranceId> {
        match self {
            Self::Submitted(id) | Self::Failed { utterance_id: id, .. } => Some(*id),
            Self::Ignored(_) => None,
        }
    }
}

// ── State ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UtterancePhase {
    /// Submitted, waiting for the platform's start notification.
    Pending,
    /// Platform confirmed playback.
    Speaking,
}

#[derive(Debug, Clone, Copy)]
struct ActiveUtterance {
    id: UtteranceId,
    phase: UtterancePhase,
}

struct ControllerState {
    current: Option<ActiveUtterance>,
}

struct ControllerInner {
    service: Arc<dyn SpeechSynthesisPort>,
    emitter: Arc<dyn AvatarEventEmitter>,
    settings: AvatarSettings,
    state: Mutex<ControllerState>,
    writer: SpeakingWriter,
    voices: RwLock<Vec<Voice>>,
}

impl ControllerInner {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_voices(&self) {
        let voices = self.service.voices();
        let count = voices.len();
        *self.voices.write().unwrap_or_else(PoisonError::into_inner) = voices;
        tracing::debug!(count, "Voice list refreshed");
        self.emitter.emit(AvatarEvent::VoicesChanged { count });
    }

    fn cached_voices(&self) -> Vec<Voice> {
        let cached = self
            .voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if !cached.is_empty() {
            return cached;
        }
        // Lists can finish loading without a change event on some platforms.
        let fresh = self.service.voices();
        if !fresh.is_empty() {
            self.voices
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clone_from(&fresh);
        }
        fresh
    }
}

/// Adapter handed to the platform; holds the controller weakly so an
/// abandoned request can't keep it alive.
struct ControllerObserver {
    inner: Weak<ControllerInner>,
}

impl UtteranceObserver for ControllerObserver {
    fn on_start(&self, id: UtteranceId) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        match state.current.as_mut() {
            Some(active) if active.id == id && active.phase == UtterancePhase::Pending => {
                active.phase = UtterancePhase::Speaking;
                inner.writer.set(true);
                inner
                    .emitter
                    .emit(AvatarEvent::SpeechStarted { utterance_id: id });
                tracing::info!(utterance_id = %id, "Speech started");
            }
            Some(active) if active.id == id => {
                tracing::warn!(utterance_id = %id, "Duplicate start notification ignored");
            }
            _ => {
                tracing::debug!(utterance_id = %id, "Start for inactive utterance ignored");
            }
        }
    }

    fn on_end(&self, id: UtteranceId) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        if state.current.is_some_and(|a| a.id == id) {
            state.current = None;
            inner.writer.set(false);
            inner
                .emitter
                .emit(AvatarEvent::SpeechEnded { utterance_id: id });
            tracing::info!(utterance_id = %id, "Speech ended");
        } else {
            tracing::debug!(utterance_id = %id, "End for inactive utterance ignored");
        }
    }

    fn on_error(&self, id: UtteranceId, error: SpeechError) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        if state.current.is_some_and(|a| a.id == id) {
            state.current = None;
            inner.writer.set(false);
            tracing::error!(utterance_id = %id, error = %error, "Speech failed");
            inner.emitter.emit(AvatarEvent::SpeechFailed {
                utterance_id: id,
                error: error.to_string(),
            });
        } else {
            tracing::debug!(
                utterance_id = %id,
                error = %error,
                "Error for inactive utterance ignored"
            );
        }
    }
}

// ── Controller ─────────────────────────────────────────────────────

/// Starts, tracks and cancels speech, publishing the speaking flag.
///
/// Cheap to clone; clones drive the same utterance.
#[derive(Clone)]
pub struct SpeechController {
    inner: Arc<ControllerInner>,
}

impl SpeechController {
    /// Create a controller over `service`.
    ///
    /// Queries the voice list immediately and subscribes to change
    /// notifications so the cached list never outlives a change event.
    pub fn new(
        service: Arc<dyn SpeechSynthesisPort>,
        settings: AvatarSettings,
        emitter: Arc<dyn AvatarEventEmitter>,
    ) -> Self {
        let (writer, _) = speaking_signal();
        let inner = Arc::new(ControllerInner {
            service,
            emitter,
            settings,
            state: Mutex::new(ControllerState { current: None }),
            writer,
            voices: RwLock::new(Vec::new()),
        });

        inner.refresh_voices();
        let weak = Arc::downgrade(&inner);
        inner.service.subscribe_voices_changed(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.refresh_voices();
            }
        }));

        Self { inner }
    }

    /// Speak `text`.
    ///
    /// Ignored if the text is blank or something is already being voiced.
    /// Otherwise any pending request is cancelled and a new utterance is
    /// submitted with the configured rate, pitch, volume and preferred voice.
    pub fn speak(&self, text: &str) -> SpeakOutcome {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring speak request with empty text");
            return SpeakOutcome::Ignored(IgnoreReason::EmptyText);
        }

        let id = UtteranceId::allocate();
        let superseded = {
            let mut state = self.inner.lock();
            if state
                .current
                .is_some_and(|a| a.phase == UtterancePhase::Speaking)
            {
                tracing::debug!("Already speaking, ignoring speak request");
                return SpeakOutcome::Ignored(IgnoreReason::AlreadySpeaking);
            }
            state.current.replace(ActiveUtterance {
                id,
                phase: UtterancePhase::Pending,
            })
        };

        self.inner.service.cancel();
        if let Some(previous) = superseded {
            tracing::info!(utterance_id = %previous.id, "Superseded pending utterance");
            self.inner.emitter.emit(AvatarEvent::SpeechCancelled {
                utterance_id: Some(previous.id),
            });
        }

        let voice = self.choose_voice();
        let settings = &self.inner.settings;
        let request = UtteranceRequest {
            id,
            text: text.to_string(),
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
            voice,
        };

        tracing::info!(
            utterance_id = %id,
            chars = request.text.len(),
            voice = request.voice.as_ref().map_or("default", |v| v.name.as_str()),
            "Submitting utterance"
        );
        self.inner.emitter.emit(AvatarEvent::SpeechSubmitted {
            utterance_id: id,
            voice: request.voice.as_ref().map(|v| v.name.clone()),
        });

        let callbacks = UtteranceCallbacks::new(
            id,
            Arc::new(ControllerObserver {
                inner: Arc::downgrade(&self.inner),
            }),
        );

        match self.inner.service.speak(request, callbacks) {
            Ok(()) => SpeakOutcome::Submitted(id),
            Err(e) => {
                {
                    let mut state = self.inner.lock();
                    if state.current.is_some_and(|a| a.id == id) {
                        state.current = None;
                        self.inner.writer.set(false);
                    }
                }
                tracing::error!(
                    utterance_id = %id,
                    error = %e,
                    "Speech service rejected utterance"
                );
                self.inner.emitter.emit(AvatarEvent::SpeechFailed {
                    utterance_id: id,
                    error: e.to_string(),
                });
                SpeakOutcome::Failed {
                    utterance_id: id,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Cancel any speech and force the idle state. Idempotent.
    pub fn stop(&self) {
        let cancelled = {
            let mut state = self.inner.lock();
            let cancelled = state.current.take();
            self.inner.writer.force_idle();
            cancelled
        };

        self.inner.service.cancel();

        if let Some(active) = cancelled {
            tracing::info!(utterance_id = %active.id, "Speech stopped");
            self.inner.emitter.emit(AvatarEvent::SpeechCancelled {
                utterance_id: Some(active.id),
            });
        }
    }

    /// Check whether an utterance is currently being voiced.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.writer.is_speaking()
    }

    /// Reader handle for the speaking flag.
    #[must_use]
    pub fn signal(&self) -> SpeakingSignal {
        self.inner.writer.signal()
    }

    /// Id of the pending or playing utterance, if any.
    #[must_use]
    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.inner.lock().current.map(|a| a.id)
    }

    /// Voices known from the last refresh.
    #[must_use]
    pub fn voices(&self) -> Vec<Voice> {
        self.inner.cached_voices()
    }

    /// The voice the heuristic would pick right now.
    #[must_use]
    pub fn choose_voice(&self) -> Option<Voice> {
        let voices = self.inner.cached_voices();
        let settings = &self.inner.settings;
        let choice = choose_voice(
            &voices,
            settings.preferred_voice_markers.as_slice(),
            &settings.preferred_locale,
        );
        if matches!(choice, VoiceChoice::PlatformDefault) {
            tracing::debug!(available = voices.len(), "No preferred voice, using platform default");
        }
        choice.voice().cloned()
    }

    #[must_use]
    pub fn settings(&self) -> &AvatarSettings {
        &self.inner.settings
    }
}
