//! Events emitted by the avatar engine.
//!
//! These are diagnostic notifications: the presentation layer renders from the
//! speaking signal and the frame channel, not from this stream.

use serde::Serialize;

use crate::domain::UtteranceId;

/// Lifecycle and diagnostics events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AvatarEvent {
    /// A request was handed to the speech service.
    #[serde(rename_all = "camelCase")]
    SpeechSubmitted {
        utterance_id: UtteranceId,
        /// Name of the selected voice, `None` for the platform default.
        voice: Option<String>,
    },

    /// The service confirmed playback started.
    #[serde(rename_all = "camelCase")]
    SpeechStarted { utterance_id: UtteranceId },

    /// Playback finished normally.
    #[serde(rename_all = "camelCase")]
    SpeechEnded { utterance_id: UtteranceId },

    /// The service reported a failure; the engine has returned to idle.
    #[serde(rename_all = "camelCase")]
    SpeechFailed {
        utterance_id: UtteranceId,
        error: String,
    },

    /// `stop()` cancelled speech. `utterance_id` is the utterance that was
    /// pending or playing, if any.
    #[serde(rename_all = "camelCase")]
    SpeechCancelled { utterance_id: Option<UtteranceId> },

    /// The platform voice list was refreshed.
    VoicesChanged { count: usize },
}

impl AvatarEvent {
    /// Utterance the event refers to, if any.
    #[must_use]
    pub const fn utterance_id(&self) -> Option<UtteranceId> {
        match self {
            Self::SpeechSubmitted { utterance_id, .. }
            | Self::SpeechStarted { utterance_id }
            | Self::SpeechEnded { utterance_id }
            | Self::SpeechFailed { utterance_id, .. } => Some(*utterance_id),
            Self::SpeechCancelled { utterance_id } => *utterance_id,
            Self::VoicesChanged { .. } => None,
        }
    }

    /// Whether this event reports a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::SpeechFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_serializes_with_tag() {
        let id = UtteranceId::allocate();
        let event = AvatarEvent::SpeechFailed {
            utterance_id: id,
            error: "synthesis-failed".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "speechFailed");
        assert_eq!(json["utteranceId"], id.get());
        assert_eq!(json["error"], "synthesis-failed");
        assert!(event.is_failure());
    }

    #[test]
    fn utterance_id_accessor() {
        let id = UtteranceId::allocate();
        assert_eq!(
            AvatarEvent::SpeechCancelled {
                utterance_id: Some(id)
            }
            .utterance_id(),
            Some(id)
        );
        assert_eq!(AvatarEvent::VoicesChanged { count: 2 }.utterance_id(), None);
    }
}
