//! ASCII avatar rendering.
//!
//! On a terminal the face is redrawn in place with ANSI cursor movement.
//! Anywhere else (pipes, files, interactive mode) each frame becomes one
//! compact line so output stays readable.

use std::io::{self, Write};

use lipsync_core::{AvatarFrame, EyeExpression, VisemeShape};

/// Height of the drawn face, including the status line.
const FACE_LINES: usize = 6;

fn eyes(expression: EyeExpression) -> &'static str {
    match expression {
        EyeExpression::Normal => "o   o",
        EyeExpression::Squint => "-   -",
        EyeExpression::Wide => "O   O",
    }
}

fn mouth(shape: VisemeShape) -> &'static str {
    match shape {
        VisemeShape::Closed => " ----- ",
        VisemeShape::Small => "  (-)  ",
        VisemeShape::Medium => " (___) ",
        VisemeShape::Wide => "(_____)",
        VisemeShape::Oh => "  (O)  ",
    }
}

/// The face as text lines, without a status line.
#[must_use]
pub fn face_lines(frame: AvatarFrame) -> [String; FACE_LINES - 1] {
    [
        "  .---------.".to_string(),
        format!("  |  {}  |", eyes(frame.eyes)),
        "  |    ^    |".to_string(),
        format!("  | {} |", mouth(frame.mouth)),
        "  '---------'".to_string(),
    ]
}

/// One-line description of a frame.
#[must_use]
pub fn frame_summary(frame: AvatarFrame, speaking: bool) -> String {
    let state = if speaking { "speaking" } else { "idle" };
    format!("[{state}] mouth={} eyes={}", frame.mouth, frame.eyes)
}

/// How frames are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Multi-line face redrawn in place.
    Face,
    /// One summary line per frame.
    Lines,
}

/// Draws successive frames to a writer.
#[derive(Debug)]
pub struct FrameRenderer {
    mode: RenderMode,
    drawn: bool,
    last: Option<(AvatarFrame, bool)>,
}

impl FrameRenderer {
    #[must_use]
    pub const fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            drawn: false,
            last: None,
        }
    }

    /// Face mode when stdout is a terminal, lines otherwise.
    #[must_use]
    pub fn for_stdout() -> Self {
        use std::io::IsTerminal;
        let mode = if io::stdout().is_terminal() {
            RenderMode::Face
        } else {
            RenderMode::Lines
        };
        Self::new(mode)
    }

    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Draw `frame`. Repeats of the previous frame are skipped.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        frame: AvatarFrame,
        speaking: bool,
    ) -> io::Result<()> {
        if self.last == Some((frame, speaking)) {
            return Ok(());
        }
        self.last = Some((frame, speaking));

        match self.mode {
            RenderMode::Lines => writeln!(out, "{}", frame_summary(frame, speaking))?,
            RenderMode::Face => {
                if self.drawn {
                    // Back to the top of the previous drawing.
                    write!(out, "\x1b[{FACE_LINES}A")?;
                }
                for line in face_lines(frame) {
                    writeln!(out, "\x1b[2K{line}")?;
                }
                let status = if speaking { "speaking..." } else { "idle" };
                writeln!(out, "\x1b[2K  {status}")?;
                self.drawn = true;
            }
        }
        out.flush()
    }
}
