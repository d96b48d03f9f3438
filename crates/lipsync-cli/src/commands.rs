//! Top-level CLI commands.

use clap::Subcommand;

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Speak some text and animate the avatar until it finishes
    Say {
        /// Text to speak
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Stop speaking after this many milliseconds
        #[arg(long, value_name = "MS")]
        stop_after: Option<u64>,
    },

    /// List available voices and show which one would be used
    Voices,

    /// Read lines from stdin and speak each one (/stop, /quit)
    Interactive,
}
