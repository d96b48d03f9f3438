//! Event emitter trait for engine diagnostics.
//!
//! This module defines the abstraction for emitting [`AvatarEvent`]s.
//! Implementations handle transport details (channels, logs, UI bridges).

use tokio::sync::mpsc;

use crate::events::AvatarEvent;

/// Trait for emitting avatar events.
///
/// This is the observability hook the speech controller reports through,
/// including platform synthesis failures that are otherwise absorbed.
///
/// # Implementations
///
/// - [`NoopEmitter`] - For tests and contexts that don't need events
/// - [`ChannelEmitter`] - Forwards events into a tokio channel
pub trait AvatarEventEmitter: Send + Sync {
    /// Emit an event.
    ///
    /// This method must not block; it is called from inside engine
    /// callbacks.
    fn emit(&self, event: AvatarEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn AvatarEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl AvatarEventEmitter for NoopEmitter {
    fn emit(&self, _event: AvatarEvent) {}

    fn clone_box(&self) -> Box<dyn AvatarEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that forwards every event into an unbounded channel.
///
/// Sending is best-effort: if the receiver has been dropped the event is
/// logged and discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<AvatarEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AvatarEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AvatarEventEmitter for ChannelEmitter {
    fn emit(&self, event: AvatarEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(event = ?e.0, "Avatar event receiver dropped");
        }
    }

    fn clone_box(&self) -> Box<dyn AvatarEventEmitter> {
        Box::new(self.clone())
    }
}
