//! Voice preference heuristic.
//!
//! Best-effort only: voice names and locales differ across platforms, so the
//! same settings may pick different voices on different machines.

use lipsync_core::Voice;

/// Outcome of the voice heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceChoice<'a> {
    /// Name contains one of the preferred markers (e.g. "Natural").
    Preferred(&'a Voice),

    /// No marker matched, but the locale did.
    Locale(&'a Voice),

    /// Nothing matched; let the platform use its default voice.
    PlatformDefault,
}

impl<'a> VoiceChoice<'a> {
    /// The chosen voice, `None` for the platform default.
    #[must_use]
    pub const fn voice(self) -> Option<&'a Voice> {
        match self {
            Self::Preferred(v) | Self::Locale(v) => Some(v),
            Self::PlatformDefault => None,
        }
    }

    /// Short label for logs and listings.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Preferred(_) => "preferred",
            Self::Locale(_) => "locale",
            Self::PlatformDefault => "platform default",
        }
    }
}

/// Pick a voice: first one whose name contains any marker, else first one
/// whose locale contains `preferred_locale`, else the platform default.
pub fn choose_voice<'a, S: AsRef<str>>(
    voices: &'a [Voice],
    markers: &[S],
    preferred_locale: &str,
) -> VoiceChoice<'a> {
    if let Some(voice) = voices.iter().find(|v| {
        markers
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|m| !m.is_empty())
            .any(|m| v.name.contains(m))
    }) {
        return VoiceChoice::Preferred(voice);
    }

    if !preferred_locale.is_empty() {
        if let Some(voice) = voices.iter().find(|v| v.locale.contains(preferred_locale)) {
            return VoiceChoice::Locale(voice);
        }
    }

    VoiceChoice::PlatformDefault
}
