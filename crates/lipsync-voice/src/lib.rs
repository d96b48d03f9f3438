//! # lipsync-voice
//!
//! The speech-to-animation synchronization engine.
//!
//! ```text
//!   speak(text) ──▶ SpeechController ──▶ SpeechSynthesisPort (platform)
//!                        │   ▲                  │
//!                        │   └── start/end/error┘
//!                        ▼
//!                  SpeakingSignal ──▶ VisemeScheduler ──▶ AvatarFrame (watch)
//! ```
//!
//! - [`controller`] owns the lifecycle of a single utterance and is the only
//!   writer of the speaking flag.
//! - [`scheduler`] cycles mouth shapes on a jittered timer while the flag is
//!   set and snaps back to closed the moment it clears.
//! - [`engine`] wires the two together and exposes the presentation-facing
//!   [`AvatarSession`].
//! - [`backend`] holds concrete speech services (simulated, `espeak-ng`).

#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings; they are used by integration tests
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;

pub mod backend;
pub mod controller;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod selection;
pub mod speaking;

// Re-export key types for convenience
pub use backend::{EspeakConfig, EspeakSpeechService, SimulatedConfig, SimulatedSpeechService};
pub use controller::{IgnoreReason, SpeakOutcome, SpeechController};
pub use engine::{AvatarEngine, AvatarSession, AvatarView, DEFAULT_GREETING};
pub use error::VoiceError;
pub use scheduler::{SchedulerConfig, SchedulerPhase, VisemeScheduler};
pub use selection::{VoiceChoice, choose_voice};
pub use speaking::{ListenerId, SpeakingListener, SpeakingSignal, SpeakingWriter, speaking_signal};
