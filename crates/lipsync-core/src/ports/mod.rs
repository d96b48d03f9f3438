//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the engine expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process, audio-device or timer types in any signature
//! - Implementations live in adapter crates (`lipsync-voice` backends, tests)

pub mod event_emitter;
pub mod speech;

pub use event_emitter::{AvatarEventEmitter, ChannelEmitter, NoopEmitter};
pub use speech::{
    SpeechError, SpeechSynthesisPort, UtteranceCallbacks, UtteranceObserver,
    VoicesChangedCallback,
};
