//! Settings domain types and validation.
//!
//! Playback parameters and animation timing for the avatar engine. These are
//! pure domain types with no infrastructure dependencies; the CLI layers
//! files, environment variables and flags on top of [`AvatarSettings::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default speaking rate.
pub const DEFAULT_RATE: f32 = 0.9;

/// Default pitch.
pub const DEFAULT_PITCH: f32 = 1.1;

/// Default volume.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Default fixed part of the viseme tick delay.
pub const DEFAULT_TICK_BASE_MS: u64 = 150;

/// Default upper bound of the random part of the viseme tick delay.
pub const DEFAULT_TICK_JITTER_MS: u64 = 100;

/// Avatar engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    /// Speaking rate multiplier.
    pub rate: f32,

    /// Pitch multiplier.
    pub pitch: f32,

    /// Volume (0.0–1.0).
    pub volume: f32,

    /// Fixed part of every viseme tick delay, in milliseconds.
    pub tick_base_ms: u64,

    /// Each tick adds a uniform random delay in `0..=tick_jitter_ms`.
    pub tick_jitter_ms: u64,

    /// Chance per tick that the eyes flash squint/wide.
    pub eye_change_probability: f64,

    /// How long a flashed eye expression is held before reverting.
    pub eye_hold_ms: u64,

    /// Voice name fragments preferred by the voice heuristic, in order.
    pub preferred_voice_markers: Vec<String>,

    /// Locale preferred when no marker matches.
    pub preferred_locale: String,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            pitch: DEFAULT_PITCH,
            volume: DEFAULT_VOLUME,
            tick_base_ms: DEFAULT_TICK_BASE_MS,
            tick_jitter_ms: DEFAULT_TICK_JITTER_MS,
            eye_change_probability: 0.3,
            eye_hold_ms: 200,
            preferred_voice_markers: vec![
                "Natural".to_string(),
                "Enhanced".to_string(),
                "Premium".to_string(),
            ],
            preferred_locale: "en-US".to_string(),
        }
    }
}

impl AvatarSettings {
    #[must_use]
    pub const fn tick_base(&self) -> Duration {
        Duration::from_millis(self.tick_base_ms)
    }

    #[must_use]
    pub const fn tick_jitter(&self) -> Duration {
        Duration::from_millis(self.tick_jitter_ms)
    }

    #[must_use]
    pub const fn eye_hold(&self) -> Duration {
        Duration::from_millis(self.eye_hold_ms)
    }
}

/// Errors that can occur during settings validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettingsError {
    #[error("Rate must be between 0.1 and 10, got {0}")]
    InvalidRate(f32),

    #[error("Pitch must be between 0 and 2, got {0}")]
    InvalidPitch(f32),

    #[error("Volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),

    #[error("Tick base delay must be greater than zero")]
    ZeroTickBase,

    #[error("Eye change probability must be between 0 and 1, got {0}")]
    InvalidEyeProbability(f64),
}

/// Validate settings values.
pub fn validate_settings(settings: &AvatarSettings) -> Result<(), SettingsError> {
    if !(0.1..=10.0).contains(&settings.rate) {
        return Err(SettingsError::InvalidRate(settings.rate));
    }

    if !(0.0..=2.0).contains(&settings.pitch) {
        return Err(SettingsError::InvalidPitch(settings.pitch));
    }

    if !(0.0..=1.0).contains(&settings.volume) {
        return Err(SettingsError::InvalidVolume(settings.volume));
    }

    if settings.tick_base_ms == 0 {
        return Err(SettingsError::ZeroTickBase);
    }

    if !(0.0..=1.0).contains(&settings.eye_change_probability) {
        return Err(SettingsError::InvalidEyeProbability(
            settings.eye_change_probability,
        ));
    }

    Ok(())
}
