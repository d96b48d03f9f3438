//! Timer-driven speech service that produces no audio.
//!
//! Behaves like a platform engine: start is reported after a short latency,
//! end after a duration estimated from the word count and rate. Useful on
//! machines without a speech engine and for exercising the engine end to end.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lipsync_core::{
    SpeechError, SpeechSynthesisPort, UtteranceCallbacks, UtteranceRequest, Voice,
    VoicesChangedCallback,
};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::{PlaybackSlot, VoiceListeners};
use crate::error::{VoiceError, current_runtime};

/// Configuration for [`SimulatedSpeechService`].
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Delay between submission and the start notification.
    pub start_latency: Duration,

    /// Speaking speed at rate 1.0.
    pub words_per_minute: u32,

    /// Shortest utterance, however few words it has.
    pub min_duration: Duration,

    /// Voices stay empty for this long after construction, then a
    /// voices-changed notification fires.
    pub voice_load_delay: Duration,

    pub voices: Vec<Voice>,

    /// When set, every utterance fails halfway through with this message.
    pub failure: Option<String>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            start_latency: Duration::from_millis(50),
            words_per_minute: 160,
            min_duration: Duration::from_millis(300),
            voice_load_delay: Duration::ZERO,
            voices: vec![
                Voice::new("alex", "Alex", "en-US").as_default(),
                Voice::new("samantha-enhanced", "Samantha (Enhanced)", "en-US"),
                Voice::new("daniel", "Daniel", "en-GB"),
                Voice::new("anna", "Anna", "de-DE"),
            ],
            failure: None,
        }
    }
}

impl SimulatedConfig {
    /// How long `request` would take to say.
    #[must_use]
    pub fn estimate_duration(&self, request: &UtteranceRequest) -> Duration {
        let rate = if request.rate > 0.0 {
            f64::from(request.rate)
        } else {
            1.0
        };
        let wpm = f64::from(self.words_per_minute.max(1)) * rate;
        #[allow(clippy::cast_precision_loss)]
        let words = request.word_count() as f64;
        Duration::from_secs_f64(words * 60.0 / wpm).max(self.min_duration)
    }
}

struct SimulatedInner {
    config: SimulatedConfig,
    runtime: Handle,
    playback: PlaybackSlot,
    voices: Mutex<Vec<Voice>>,
    listeners: VoiceListeners,
    last_request: Mutex<Option<UtteranceRequest>>,
}

/// A speech service with realistic timing and no audio output.
#[derive(Clone)]
pub struct SimulatedSpeechService {
    inner: Arc<SimulatedInner>,
}

impl SimulatedSpeechService {
    /// Create a service bound to the current tokio runtime.
    pub fn new(config: SimulatedConfig) -> Result<Self, VoiceError> {
        Ok(Self::with_runtime(config, current_runtime()?))
    }

    #[must_use]
    pub fn with_runtime(config: SimulatedConfig, runtime: Handle) -> Self {
        let delay = config.voice_load_delay;
        let initial = if delay.is_zero() {
            config.voices.clone()
        } else {
            Vec::new()
        };

        let inner = Arc::new(SimulatedInner {
            config,
            runtime,
            playback: PlaybackSlot::default(),
            voices: Mutex::new(initial),
            listeners: VoiceListeners::default(),
            last_request: Mutex::new(None),
        });

        if !delay.is_zero() {
            let weak = Arc::downgrade(&inner);
            inner.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let loaded = inner.config.voices.clone();
                let count = loaded.len();
                *inner.voices.lock().unwrap_or_else(PoisonError::into_inner) = loaded;
                tracing::debug!(count, "Simulated voices loaded");
                inner.listeners.notify();
            });
        }

        Self { inner }
    }

    /// The most recently submitted request.
    #[must_use]
    pub fn last_request(&self) -> Option<UtteranceRequest> {
        self.inner
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn config(&self) -> &SimulatedConfig {
        &self.inner.config
    }
}

impl SpeechSynthesisPort for SimulatedSpeechService {
    fn speak(
        &self,
        request: UtteranceRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<(), SpeechError> {
        let duration = self.inner.config.estimate_duration(&request);
        let token = self.inner.playback.begin(request.id);
        tracing::debug!(
            utterance_id = %request.id,
            duration_ms = duration.as_millis(),
            "Simulating utterance"
        );
        *self
            .inner
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request);

        self.inner.runtime.spawn(simulate(
            Arc::clone(&self.inner),
            callbacks,
            token,
            duration,
        ));
        Ok(())
    }

    fn cancel(&self) {
        if let Some(id) = self.inner.playback.cancel() {
            tracing::debug!(utterance_id = %id, "Simulated utterance cancelled");
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.inner
            .voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe_voices_changed(&self, callback: VoicesChangedCallback) {
        self.inner.listeners.push(callback);
    }
}

async fn simulate(
    inner: Arc<SimulatedInner>,
    callbacks: UtteranceCallbacks,
    token: CancellationToken,
    duration: Duration,
) {
    let latency = inner.config.start_latency;
    tokio::select! {
        biased;
        () = token.cancelled() => {
            callbacks.failed(SpeechError::Interrupted);
            return;
        }
        () = tokio::time::sleep(latency) => {}
    }
    callbacks.started();

    let speaking_for = if inner.config.failure.is_some() {
        duration / 2
    } else {
        duration
    };
    tokio::select! {
        biased;
        () = token.cancelled() => {
            callbacks.failed(SpeechError::Interrupted);
            return;
        }
        () = tokio::time::sleep(speaking_for) => {}
    }

    if !inner.playback.finish(callbacks.id()) {
        return;
    }
    match &inner.config.failure {
        Some(message) => callbacks.failed(SpeechError::Synthesis(message.clone())),
        None => callbacks.ended(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipsync_core::{UtteranceId, UtteranceObserver};

    #[derive(Default)]
    struct Log {
        entries: Mutex<Vec<String>>,
    }

    impl UtteranceObserver for Log {
        fn on_start(&self, _id: UtteranceId) {
            self.entries.lock().unwrap().push("start".into());
        }

        fn on_end(&self, _id: UtteranceId) {
            self.entries.lock().unwrap().push("end".into());
        }

        fn on_error(&self, _id: UtteranceId, error: SpeechError) {
            self.entries.lock().unwrap().push(format!("error: {error}"));
        }
    }

    fn request(text: &str, rate: f32) -> UtteranceRequest {
        UtteranceRequest {
            id: UtteranceId::allocate(),
            text: text.to_string(),
            rate,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }

    #[test]
    fn duration_scales_with_words_and_rate() {
        let config = SimulatedConfig::default();
        let eight_words = request("one two three four five six seven eight", 1.0);
        assert_eq!(config.estimate_duration(&eight_words), Duration::from_secs(3));

        let fast = request("one two three four five six seven eight", 2.0);
        assert_eq!(config.estimate_duration(&fast), Duration::from_millis(1500));

        let short = request("Hi", 1.0);
        assert_eq!(config.estimate_duration(&short), Duration::from_millis(375));

        let tiny = SimulatedConfig {
            words_per_minute: 6000,
            ..SimulatedConfig::default()
        };
        assert_eq!(tiny.estimate_duration(&short), tiny.min_duration);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_start_then_end() {
        let service = SimulatedSpeechService::new(SimulatedConfig::default()).unwrap();
        let log = Arc::new(Log::default());
        let req = request("Hi", 1.0);
        let callbacks = UtteranceCallbacks::new(req.id, log.clone());

        service.speak(req, callbacks).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*log.entries.lock().unwrap(), vec!["start"]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*log.entries.lock().unwrap(), vec!["start", "end"]);
        assert_eq!(service.last_request().map(|r| r.text), Some("Hi".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_interruption() {
        let service = SimulatedSpeechService::new(SimulatedConfig::default()).unwrap();
        let log = Arc::new(Log::default());
        let req = request("a long sentence that takes a while", 1.0);
        let callbacks = UtteranceCallbacks::new(req.id, log.clone());

        service.speak(req, callbacks).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        service.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            *log.entries.lock().unwrap(),
            vec!["start", "error: Utterance interrupted"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn configured_failure_is_reported_after_start() {
        let config = SimulatedConfig {
            failure: Some("audio device lost".into()),
            ..SimulatedConfig::default()
        };
        let service = SimulatedSpeechService::new(config).unwrap();
        let log = Arc::new(Log::default());
        let req = request("Hi there", 1.0);
        let callbacks = UtteranceCallbacks::new(req.id, log.clone());

        service.speak(req, callbacks).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            *log.entries.lock().unwrap(),
            vec![
                "start".to_string(),
                "error: Speech synthesis failed: audio device lost".to_string()
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn voices_load_after_delay() {
        let config = SimulatedConfig {
            voice_load_delay: Duration::from_millis(500),
            ..SimulatedConfig::default()
        };
        let expected = config.voices.len();
        let service = SimulatedSpeechService::new(config).unwrap();
        let notified = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&notified);
        service.subscribe_voices_changed(Arc::new(move || {
            *counter.lock().unwrap() += 1;
        }));

        assert!(service.voices().is_empty());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(service.voices().len(), expected);
        assert_eq!(*notified.lock().unwrap(), 1);
    }
}
