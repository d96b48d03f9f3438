//! Speaking signal: the single boolean shared between the controller, the
//! viseme scheduler and the presentation layer.
//!
//! There is exactly one writer ([`SpeakingWriter`], owned by the speech
//! controller) and any number of readers ([`SpeakingSignal`]). Readers either
//! poll [`SpeakingSignal::is_speaking`] or register a [`SpeakingListener`],
//! which is called synchronously on every change.
//!
//! # Ordering
//!
//! - Rising edge: the flag is stored first, then listeners run.
//! - Falling edge: listeners run first, then the flag is stored.
//!
//! So a reader that observes `false` is guaranteed every listener has already
//! reacted to the falling edge (e.g. the scheduler has reset the mouth).

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives speaking-state changes.
///
/// Called while the controller holds its state lock: implementations must not
/// call back into the controller and must not block.
pub trait SpeakingListener: Send + Sync {
    fn on_speaking_changed(&self, speaking: bool);
}

/// Handle returned by [`SpeakingSignal::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Shared {
    is_speaking: AtomicBool,
    next_listener: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn SpeakingListener>)>>,
}

impl Shared {
    fn snapshot(&self) -> Vec<Arc<dyn SpeakingListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    fn notify(&self, speaking: bool) {
        // Snapshot first so listeners may (un)subscribe without deadlocking.
        for listener in self.snapshot() {
            listener.on_speaking_changed(speaking);
        }
    }
}

/// Create a linked writer/reader pair, initially not speaking.
#[must_use]
pub fn speaking_signal() -> (SpeakingWriter, SpeakingSignal) {
    let shared = Arc::new(Shared {
        is_speaking: AtomicBool::new(false),
        next_listener: AtomicU64::new(1),
        listeners: Mutex::new(Vec::new()),
    });
    (
        SpeakingWriter {
            shared: Arc::clone(&shared),
        },
        SpeakingSignal { shared },
    )
}

/// Read side of the speaking flag. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SpeakingSignal {
    shared: Arc<Shared>,
}

impl SpeakingSignal {
    /// Check whether an utterance is currently being voiced.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.shared.is_speaking.load(Ordering::SeqCst)
    }

    /// Register a listener for every subsequent change.
    pub fn subscribe(&self, listener: Arc<dyn SpeakingListener>) -> ListenerId {
        let id = ListenerId(self.shared.next_listener.fetch_add(1, Ordering::Relaxed));
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        tracing::debug!(listener = id.0, "Speaking listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!(listener = id.0, "Speaking listener unsubscribed");
        }
        removed
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for SpeakingSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakingSignal")
            .field("is_speaking", &self.is_speaking())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Write side of the speaking flag. Not `Clone`: there is one writer.
pub struct SpeakingWriter {
    shared: Arc<Shared>,
}

impl SpeakingWriter {
    /// Set the flag, notifying listeners if it changed.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, speaking: bool) -> bool {
        if speaking {
            let was = self.shared.is_speaking.swap(true, Ordering::SeqCst);
            if !was {
                tracing::debug!("Speaking signal raised");
                self.shared.notify(true);
            }
            !was
        } else if self.shared.is_speaking.load(Ordering::SeqCst) {
            self.shared.notify(false);
            self.shared.is_speaking.store(false, Ordering::SeqCst);
            tracing::debug!("Speaking signal cleared");
            true
        } else {
            false
        }
    }

    /// Clear the flag and notify listeners even if it was already clear.
    ///
    /// Used by `stop()` so listeners halt unconditionally.
    pub fn force_idle(&self) {
        self.shared.notify(false);
        self.shared.is_speaking.store(false, Ordering::SeqCst);
    }

    /// A reader handle linked to this writer.
    #[must_use]
    pub fn signal(&self) -> SpeakingSignal {
        SpeakingSignal {
            shared: Arc::clone(&self.shared),
        }
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.shared.is_speaking.load(Ordering::SeqCst)
    }
}
