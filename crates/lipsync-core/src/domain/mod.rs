//! Domain types for the avatar engine.
//!
//! These are pure value types with no infrastructure dependencies.

pub mod utterance;
pub mod viseme;

pub use utterance::{UtteranceId, UtteranceRequest, Voice};
pub use viseme::{AvatarFrame, EyeExpression, SCHEDULE_SEQUENCE, VisemeShape};
