//! Avatar engine: composes the speech controller and the viseme scheduler.
//!
//! The engine is the composition root for one avatar. It validates settings,
//! subscribes the scheduler to the controller's speaking flag, and tears the
//! whole graph down on [`AvatarEngine::shutdown`] or drop.
//!
//! [`AvatarSession`] sits on top and holds the editable text, mirroring what
//! an interactive front end needs: a text field that locks while speaking and
//! a speak button that is enabled only for non-blank text.

use std::sync::{Arc, Mutex, PoisonError};

use lipsync_core::{
    AvatarEventEmitter, AvatarFrame, AvatarSettings, SpeechSynthesisPort, validate_settings,
};
use serde::Serialize;
use tokio::sync::watch;

use crate::controller::{SpeakOutcome, SpeechController};
use crate::error::VoiceError;
use crate::scheduler::{SchedulerConfig, VisemeScheduler};
use crate::speaking::{ListenerId, SpeakingListener};

/// Text pre-filled in a fresh session.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your AI avatar assistant. Type something for me to say!";

/// Mirrors speaking-flag changes into a `watch` channel for async readers.
struct WatchForwarder {
    tx: watch::Sender<bool>,
}

impl SpeakingListener for WatchForwarder {
    fn on_speaking_changed(&self, speaking: bool) {
        self.tx.send_replace(speaking);
    }
}

// ── Engine ─────────────────────────────────────────────────────────

/// One avatar: speech controller plus viseme scheduler.
pub struct AvatarEngine {
    controller: SpeechController,
    scheduler: VisemeScheduler,
    subscriptions: Mutex<Vec<ListenerId>>,
}

impl AvatarEngine {
    /// Build an engine over `service`.
    ///
    /// Must be called inside a tokio runtime; the scheduler spawns its
    /// timers onto it.
    pub fn new(
        service: Arc<dyn SpeechSynthesisPort>,
        settings: AvatarSettings,
        emitter: Arc<dyn AvatarEventEmitter>,
    ) -> Result<Self, VoiceError> {
        validate_settings(&settings)?;

        let scheduler = VisemeScheduler::new(SchedulerConfig::from(&settings))?;
        let controller = SpeechController::new(service, settings, emitter);
        let scheduler_sub = controller
            .signal()
            .subscribe(Arc::new(scheduler.clone()));

        tracing::debug!(
            voices = controller.voices().len(),
            "Avatar engine initialised"
        );

        Ok(Self {
            controller,
            scheduler,
            subscriptions: Mutex::new(vec![scheduler_sub]),
        })
    }

    /// Speak `text`. See [`SpeechController::speak`].
    pub fn speak(&self, text: &str) -> SpeakOutcome {
        self.controller.speak(text)
    }

    /// Stop speech and close the mouth. Idempotent.
    pub fn stop(&self) {
        self.controller.stop();
        // The falling edge already halted the scheduler; this covers a
        // scheduler that was started directly.
        self.scheduler.halt();
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.controller.is_speaking()
    }

    /// The frame currently on display.
    #[must_use]
    pub fn frame(&self) -> AvatarFrame {
        self.scheduler.frame()
    }

    /// Subscribe to frame changes.
    #[must_use]
    pub fn watch_frames(&self) -> watch::Receiver<AvatarFrame> {
        self.scheduler.watch()
    }

    /// Subscribe to speaking-flag changes as a `watch` channel.
    #[must_use]
    pub fn watch_speaking(&self) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(self.controller.is_speaking());
        let id = self
            .controller
            .signal()
            .subscribe(Arc::new(WatchForwarder { tx }));
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        rx
    }

    #[must_use]
    pub const fn controller(&self) -> &SpeechController {
        &self.controller
    }

    #[must_use]
    pub const fn scheduler(&self) -> &VisemeScheduler {
        &self.scheduler
    }

    /// Unsubscribe all listeners, cancel speech and dispose the scheduler.
    ///
    /// Safe to call more than once; drop calls it too.
    pub fn shutdown(&self) {
        let subscriptions: Vec<ListenerId> = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if subscriptions.is_empty() {
            return;
        }

        let signal = self.controller.signal();
        for id in subscriptions {
            signal.unsubscribe(id);
        }
        self.controller.stop();
        self.scheduler.dispose();
        tracing::debug!("Avatar engine shut down");
    }
}

impl Drop for AvatarEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Session ────────────────────────────────────────────────────────

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarView {
    pub text: String,
    pub is_speaking: bool,
    pub frame: AvatarFrame,
    /// Whether the speak action is enabled.
    pub can_speak: bool,
}

/// Editable text plus an engine.
///
/// The text cannot be changed while the avatar is speaking, and speaking is
/// only offered for non-blank text.
pub struct AvatarSession {
    engine: AvatarEngine,
    text: Mutex<String>,
}

impl AvatarSession {
    /// Create a session pre-filled with [`DEFAULT_GREETING`].
    #[must_use]
    pub fn new(engine: AvatarEngine) -> Self {
        Self::with_text(engine, DEFAULT_GREETING)
    }

    #[must_use]
    pub fn with_text(engine: AvatarEngine, text: impl Into<String>) -> Self {
        Self {
            engine,
            text: Mutex::new(text.into()),
        }
    }

    /// Replace the text. Returns `false` (and keeps the old text) while
    /// speaking.
    pub fn set_text(&self, text: impl Into<String>) -> bool {
        if self.engine.is_speaking() {
            tracing::debug!("Text is locked while speaking");
            return false;
        }
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
        true
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Speak the current text.
    pub fn request_speak(&self) -> SpeakOutcome {
        let text = self.text();
        self.engine.speak(&text)
    }

    pub fn request_stop(&self) {
        self.engine.stop();
    }

    #[must_use]
    pub fn view(&self) -> AvatarView {
        let text = self.text();
        let is_speaking = self.engine.is_speaking();
        AvatarView {
            can_speak: !is_speaking && !text.trim().is_empty(),
            text,
            is_speaking,
            frame: self.engine.frame(),
        }
    }

    #[must_use]
    pub fn watch_frames(&self) -> watch::Receiver<AvatarFrame> {
        self.engine.watch_frames()
    }

    #[must_use]
    pub const fn engine(&self) -> &AvatarEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipsync_core::{
        NoopEmitter, SpeechError, UtteranceCallbacks, UtteranceRequest, Voice,
        VoicesChangedCallback,
    };

    #[derive(Default)]
    struct ManualService {
        last: Mutex<Option<UtteranceCallbacks>>,
    }

    impl SpeechSynthesisPort for ManualService {
        fn speak(
            &self,
            _request: UtteranceRequest,
            callbacks: UtteranceCallbacks,
        ) -> Result<(), SpeechError> {
            *self.last.lock().unwrap() = Some(callbacks);
            Ok(())
        }

        fn cancel(&self) {}

        fn voices(&self) -> Vec<Voice> {
            Vec::new()
        }

        fn subscribe_voices_changed(&self, _callback: VoicesChangedCallback) {}
    }

    fn engine(service: &Arc<ManualService>) -> AvatarEngine {
        AvatarEngine::new(
            service.clone(),
            AvatarSettings::default(),
            Arc::new(NoopEmitter::new()),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_settings_are_rejected() {
        let settings = AvatarSettings {
            volume: 4.0,
            ..AvatarSettings::default()
        };
        let result = AvatarEngine::new(
            Arc::new(ManualService::default()),
            settings,
            Arc::new(NoopEmitter::new()),
        );
        assert!(matches!(result, Err(VoiceError::InvalidSettings(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn session_starts_with_greeting() {
        let session = AvatarSession::new(engine(&Arc::new(ManualService::default())));
        let view = session.view();
        assert_eq!(view.text, DEFAULT_GREETING);
        assert!(view.can_speak);
        assert!(!view.is_speaking);
        assert_eq!(view.frame, AvatarFrame::IDLE);
    }

    #[tokio::test(start_paused = true)]
    async fn text_is_locked_while_speaking() {
        let service = Arc::new(ManualService::default());
        let session = AvatarSession::with_text(engine(&service), "Hi");

        assert!(session.request_speak().is_submitted());
        service.last.lock().unwrap().clone().unwrap().started();

        assert!(!session.set_text("something else"));
        assert_eq!(session.text(), "Hi");
        assert!(!session.view().can_speak);

        session.request_stop();
        assert!(session.set_text("   "));
        assert!(!session.view().can_speak);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_speaking_follows_flag() {
        let service = Arc::new(ManualService::default());
        let engine = engine(&service);
        let rx = engine.watch_speaking();
        assert!(!*rx.borrow());

        engine.speak("Hello there");
        service.last.lock().unwrap().clone().unwrap().started();
        assert!(*rx.borrow());

        engine.stop();
        assert!(!*rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_detaches_listeners() {
        let service = Arc::new(ManualService::default());
        let engine = engine(&service);
        let _rx = engine.watch_speaking();
        let signal = engine.controller().signal();
        assert_eq!(signal.listener_count(), 2);

        engine.shutdown();
        engine.shutdown();
        assert_eq!(signal.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_while_speaking_cancels_the_cycle() {
        let service = Arc::new(ManualService::default());
        let engine = engine(&service);
        let scheduler = engine.scheduler().clone();

        engine.speak("Hello there");
        service.last.lock().unwrap().clone().unwrap().started();
        tokio::time::sleep(scheduler.config().max_tick_interval() * 2).await;
        let ticks = scheduler.ticks();
        assert!(ticks >= 1);
        assert!(scheduler.is_cycling());

        drop(engine);
        assert_eq!(scheduler.frame(), AvatarFrame::IDLE);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(scheduler.ticks(), ticks);
        assert_eq!(scheduler.frame(), AvatarFrame::IDLE);
        assert!(!scheduler.is_cycling());
    }
}
