//! Utterances and the voices they can be spoken with.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for one submitted utterance.
///
/// Platform callbacks carry the id of the utterance they belong to, which lets
/// the speech controller discard notifications for superseded requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Allocate the next id.
    pub fn allocate() -> Self {
        Self(NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// A voice offered by the platform speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// Backend-specific identifier passed back on submission.
    pub id: String,

    /// Human-readable name (e.g. `"Samantha (Enhanced)"`).
    pub name: String,

    /// BCP 47 locale tag (e.g. `"en-US"`).
    pub locale: String,

    /// Whether the platform marks this as its default voice.
    #[serde(default)]
    pub is_default: bool,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locale: locale.into(),
            is_default: false,
        }
    }

    /// Mark this voice as the platform default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// An immutable text-to-speech request handed to the platform service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceRequest {
    pub id: UtteranceId,

    /// Text as submitted by the user (guaranteed non-blank).
    pub text: String,

    /// Speaking rate multiplier (1.0 = platform normal).
    pub rate: f32,

    /// Pitch multiplier (1.0 = platform normal).
    pub pitch: f32,

    /// Volume in 0.0–1.0.
    pub volume: f32,

    /// Selected voice, or `None` for the platform default.
    pub voice: Option<Voice>,
}

impl UtteranceRequest {
    /// Number of whitespace-separated words, used for duration estimates.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
