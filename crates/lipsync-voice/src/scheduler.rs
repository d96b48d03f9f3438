//! Viseme scheduler. Cycles mouth shapes while speech plays.
//!
//! ```text
//!   Idle(closed) ──speaking=true──▶ Cycling(sequence[i]) ──tick──▶ Cycling(sequence[i+1])
//!        ▲                                 │
//!        └──────────speaking=false─────────┘
//! ```
//!
//! Each tick re-arms a one-shot timer with a fresh `base + jitter` delay, so
//! the mouth never moves with a perfectly periodic rhythm.
//!
//! # Cancellation
//!
//! Every cycle gets a generation number and a [`CancellationToken`]. Halting
//! bumps the generation and cancels the token while holding the state lock,
//! and a tick only applies its effect after re-checking both under that same
//! lock. A tick that loses the race is therefore a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use lipsync_core::{AvatarFrame, AvatarSettings, EyeExpression, SCHEDULE_SEQUENCE};
use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{VoiceError, current_runtime};
use crate::speaking::SpeakingListener;

// ── Configuration ──────────────────────────────────────────────────

/// Timing and expression parameters for the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Fixed part of each tick delay.
    pub tick_base: Duration,

    /// Upper bound of the uniform random part of each tick delay.
    pub tick_jitter: Duration,

    /// Chance per tick of flashing a squint/wide eye expression.
    pub eye_change_probability: f64,

    /// How long a flashed expression is held.
    pub eye_hold: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&AvatarSettings::default())
    }
}

impl From<&AvatarSettings> for SchedulerConfig {
    fn from(settings: &AvatarSettings) -> Self {
        Self {
            tick_base: settings.tick_base(),
            tick_jitter: settings.tick_jitter(),
            eye_change_probability: settings.eye_change_probability.clamp(0.0, 1.0),
            eye_hold: settings.eye_hold(),
        }
    }
}

impl SchedulerConfig {
    /// Draw the delay until the next tick.
    pub fn next_delay(&self) -> Duration {
        #[allow(clippy::cast_possible_truncation)]
        let jitter_ms = self.tick_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.tick_base;
        }
        self.tick_base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    /// Longest possible gap between two ticks.
    #[must_use]
    pub fn max_tick_interval(&self) -> Duration {
        self.tick_base + self.tick_jitter
    }

    fn roll_eye_expression(&self) -> Option<EyeExpression> {
        if self.eye_change_probability <= 0.0 {
            return None;
        }
        let mut rng = rand::rng();
        if !rng.random_bool(self.eye_change_probability) {
            return None;
        }
        Some(if rng.random_bool(0.5) {
            EyeExpression::Squint
        } else {
            EyeExpression::Wide
        })
    }
}

// ── State ──────────────────────────────────────────────────────────

/// Current phase of the scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Not speaking: mouth closed, no timer armed.
    Idle,

    /// Speaking: the timer is armed and ticks advance the sequence.
    Cycling,
}

struct CycleTimer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CycleTimer {
    fn cancel(self) {
        self.token.cancel();
        self.task.abort();
    }
}

struct SchedulerState {
    phase: SchedulerPhase,
    /// Index of the next shape to publish.
    index: usize,
    generation: u64,
    /// Bumped on every eye flash so a stale revert can't clear a newer one.
    eye_flash: u64,
    timer: Option<CycleTimer>,
    ticks: u64,
    disposed: bool,
}

struct SchedulerInner {
    config: SchedulerConfig,
    runtime: Handle,
    state: Mutex<SchedulerState>,
    frames: watch::Sender<AvatarFrame>,
}

impl SchedulerInner {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, frame: AvatarFrame) {
        self.frames.send_if_modified(|current| {
            if *current == frame {
                false
            } else {
                *current = frame;
                true
            }
        });
    }

    fn start(self: &Arc<Self>) {
        let mut state = self.lock();
        if state.disposed {
            tracing::warn!("Viseme scheduler disposed, ignoring start");
            return;
        }
        if state.phase == SchedulerPhase::Cycling {
            return;
        }

        state.generation += 1;
        state.index = 0;
        state.phase = SchedulerPhase::Cycling;

        let token = CancellationToken::new();
        let task = self.runtime.spawn(run_cycle(
            Arc::downgrade(self),
            state.generation,
            token.clone(),
        ));
        state.timer = Some(CycleTimer { token, task });

        tracing::debug!(generation = state.generation, "Viseme cycle started");
    }

    /// Cancel the cycle and reset. With `dispose`, the scheduler is also
    /// retired in the same critical section so no `start` can slip in.
    fn halt(&self, dispose: bool) {
        let mut state = self.lock();
        state.disposed |= dispose;
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        let was_cycling = state.phase == SchedulerPhase::Cycling;
        state.phase = SchedulerPhase::Idle;
        state.index = 0;
        // Published under the lock so no tick can interleave with the reset.
        self.publish(AvatarFrame::IDLE);
        drop(state);

        if was_cycling {
            tracing::debug!("Viseme cycle halted");
        }
    }

    /// Apply one tick. Returns `false` when the cycle is no longer current.
    fn tick(self: &Arc<Self>, generation: u64, token: &CancellationToken) -> bool {
        let mut state = self.lock();
        if token.is_cancelled()
            || state.generation != generation
            || state.phase != SchedulerPhase::Cycling
        {
            return false;
        }

        let mouth = SCHEDULE_SEQUENCE[state.index];
        state.index = (state.index + 1) % SCHEDULE_SEQUENCE.len();
        state.ticks += 1;

        let mut frame = *self.frames.borrow();
        frame.mouth = mouth;

        if let Some(eyes) = self.config.roll_eye_expression() {
            frame.eyes = eyes;
            state.eye_flash += 1;
            self.runtime.spawn(revert_eyes(
                Arc::downgrade(self),
                generation,
                state.eye_flash,
                token.child_token(),
                self.config.eye_hold,
            ));
        }

        tracing::trace!(shape = %frame.mouth, eyes = %frame.eyes, "Viseme tick");
        self.publish(frame);
        true
    }

    fn revert_eyes(&self, generation: u64, flash: u64, token: &CancellationToken) {
        let state = self.lock();
        if token.is_cancelled() || state.generation != generation || state.eye_flash != flash {
            return;
        }
        let mut frame = *self.frames.borrow();
        frame.eyes = EyeExpression::Normal;
        self.publish(frame);
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
    }
}

/// Re-arming timer loop for one cycle.
///
/// Holds only a weak reference so a dropped scheduler ends the loop.
async fn run_cycle(inner: Weak<SchedulerInner>, generation: u64, token: CancellationToken) {
    loop {
        let delay = match inner.upgrade() {
            Some(inner) => inner.config.next_delay(),
            None => return,
        };

        tokio::select! {
            biased;
            () = token.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }

        let Some(strong) = inner.upgrade() else {
            return;
        };
        if !strong.tick(generation, &token) {
            return;
        }
    }
}

async fn revert_eyes(
    inner: Weak<SchedulerInner>,
    generation: u64,
    flash: u64,
    token: CancellationToken,
    hold: Duration,
) {
    tokio::select! {
        biased;
        () = token.cancelled() => return,
        () = tokio::time::sleep(hold) => {}
    }
    if let Some(inner) = inner.upgrade() {
        inner.revert_eyes(generation, flash, &token);
    }
}

// ── Public handle ──────────────────────────────────────────────────

/// Drives the mouth-shape cycle for the duration of an utterance.
///
/// Cheap to clone; clones share the same state machine. Register a clone as a
/// [`SpeakingListener`] to have it follow the speaking flag.
#[derive(Clone)]
pub struct VisemeScheduler {
    inner: Arc<SchedulerInner>,
}

impl VisemeScheduler {
    /// Create a scheduler bound to the current tokio runtime.
    pub fn new(config: SchedulerConfig) -> Result<Self, VoiceError> {
        let runtime = current_runtime()?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create a scheduler that spawns its timers onto `runtime`.
    #[must_use]
    pub fn with_runtime(config: SchedulerConfig, runtime: Handle) -> Self {
        let (frames, _) = watch::channel(AvatarFrame::IDLE);
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                runtime,
                state: Mutex::new(SchedulerState {
                    phase: SchedulerPhase::Idle,
                    index: 0,
                    generation: 0,
                    eye_flash: 0,
                    timer: None,
                    ticks: 0,
                    disposed: false,
                }),
                frames,
            }),
        }
    }

    /// Enter `Cycling`. No-op if already cycling.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Cancel the timer and reset to the idle frame. Idempotent.
    pub fn halt(&self) {
        self.inner.halt(false);
    }

    /// Halt permanently; later `start` calls are ignored.
    pub fn dispose(&self) {
        self.inner.halt(true);
        tracing::debug!("Viseme scheduler disposed");
    }

    /// The frame currently on display.
    #[must_use]
    pub fn frame(&self) -> AvatarFrame {
        *self.inner.frames.borrow()
    }

    /// Subscribe to frame changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AvatarFrame> {
        self.inner.frames.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.inner.lock().phase
    }

    #[must_use]
    pub fn is_cycling(&self) -> bool {
        self.phase() == SchedulerPhase::Cycling
    }

    /// Total ticks applied over the scheduler's lifetime.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.inner.lock().ticks
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }
}

impl SpeakingListener for VisemeScheduler {
    fn on_speaking_changed(&self, speaking: bool) {
        if speaking {
            self.start();
        } else {
            self.halt();
        }
    }
}
