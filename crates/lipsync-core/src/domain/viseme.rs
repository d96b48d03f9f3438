//! Mouth and eye shapes published by the viseme scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse mouth aperture used as an animation state.
///
/// This is not a phonetic model: shapes follow [`SCHEDULE_SEQUENCE`] in a
/// fixed round-robin order while speech plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisemeShape {
    /// Neutral resting mouth. The only valid shape while not speaking.
    #[default]
    Closed,
    Small,
    Medium,
    Wide,
    Oh,
}

impl VisemeShape {
    /// All shapes, closed first.
    pub const ALL: [Self; 5] = [
        Self::Closed,
        Self::Small,
        Self::Medium,
        Self::Wide,
        Self::Oh,
    ];

    /// Stable lowercase label (`"closed"`, `"small"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Wide => "wide",
            Self::Oh => "oh",
        }
    }

    /// Whether the mouth is open at all.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for VisemeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed cycle the scheduler walks through while speaking.
///
/// Shared read-only by every scheduler instance.
pub const SCHEDULE_SEQUENCE: [VisemeShape; 6] = [
    VisemeShape::Small,
    VisemeShape::Medium,
    VisemeShape::Wide,
    VisemeShape::Oh,
    VisemeShape::Medium,
    VisemeShape::Small,
];

/// Eye expression flashed occasionally while speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EyeExpression {
    #[default]
    Normal,
    Squint,
    Wide,
}

impl EyeExpression {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Squint => "squint",
            Self::Wide => "wide",
        }
    }
}

impl fmt::Display for EyeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One renderable animation frame: the current mouth and eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarFrame {
    pub mouth: VisemeShape,
    pub eyes: EyeExpression,
}

impl AvatarFrame {
    /// The resting frame shown whenever nothing is being spoken.
    pub const IDLE: Self = Self {
        mouth: VisemeShape::Closed,
        eyes: EyeExpression::Normal,
    };

    /// Whether this is the resting frame.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_never_contains_closed() {
        assert!(SCHEDULE_SEQUENCE.iter().all(|s| s.is_open()));
    }

    #[test]
    fn sequence_order_is_fixed() {
        use VisemeShape::{Medium, Oh, Small, Wide};
        assert_eq!(SCHEDULE_SEQUENCE, [Small, Medium, Wide, Oh, Medium, Small]);
    }

    #[test]
    fn default_frame_is_idle() {
        assert!(AvatarFrame::default().is_idle());
        assert_eq!(AvatarFrame::IDLE.mouth, VisemeShape::Closed);
        assert_eq!(AvatarFrame::IDLE.eyes, EyeExpression::Normal);
    }

    #[test]
    fn labels_are_lowercase() {
        for shape in VisemeShape::ALL {
            assert_eq!(shape.to_string(), shape.as_str());
            assert_eq!(shape.as_str(), shape.as_str().to_lowercase());
        }
        assert_eq!(EyeExpression::Squint.to_string(), "squint");
    }

    #[test]
    fn serializes_as_camel_case_labels() {
        let json = serde_json::to_string(&VisemeShape::Oh).unwrap();
        assert_eq!(json, "\"oh\"");
    }
}
