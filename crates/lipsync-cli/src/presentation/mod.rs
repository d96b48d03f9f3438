//! Shared CLI presentation utilities.
//!
//! # Guidelines
//!
//! - Keep this module format-only: no engine calls
//! - Handlers decide what to show; these helpers decide how it looks

pub mod face;
pub mod tables;

// Re-export commonly used items
pub use face::{FrameRenderer, RenderMode, face_lines, frame_summary};
pub use tables::{print_separator, truncate_string};
