//! # lipsync-core
//!
//! Domain types and port definitions shared by every lipsync crate.
//!
//! - [`domain`] - viseme shapes, the fixed schedule sequence, utterances, voices
//! - [`ports`] - trait abstractions for the platform speech service and the
//!   diagnostics event sink
//! - [`events`] - events emitted by the engine for observability
//! - [`settings`] - tunable playback and animation settings with validation
//!
//! This crate has no runtime behaviour of its own; `lipsync-voice` implements
//! the engine on top of these types.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AvatarFrame, EyeExpression, SCHEDULE_SEQUENCE, UtteranceId, UtteranceRequest, VisemeShape,
    Voice,
};
pub use events::AvatarEvent;
pub use ports::{
    AvatarEventEmitter, ChannelEmitter, NoopEmitter, SpeechError, SpeechSynthesisPort,
    UtteranceCallbacks, UtteranceObserver, VoicesChangedCallback,
};
pub use settings::{
    AvatarSettings, DEFAULT_PITCH, DEFAULT_RATE, DEFAULT_VOLUME, SettingsError, validate_settings,
};
