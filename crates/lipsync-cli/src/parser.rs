//! Main CLI parser and top-level argument handling.
//!
//! Global options override the config file. Each can also be set through a
//! `LIPSYNC_*` environment variable (or `.env`).

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;
use crate::config::BackendKind;

/// Command-line interface for the talking avatar.
#[derive(Parser)]
#[command(name = "lipsync")]
#[command(about = "A terminal avatar that moves its mouth while it talks")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "LIPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Speech backend
    #[arg(long, global = true, value_enum, env = "LIPSYNC_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Speaking rate multiplier (0.1-10)
    #[arg(long, global = true, env = "LIPSYNC_RATE")]
    pub rate: Option<f32>,

    /// Pitch multiplier (0-2)
    #[arg(long, global = true, env = "LIPSYNC_PITCH")]
    pub pitch: Option<f32>,

    /// Volume (0-1)
    #[arg(long, global = true, env = "LIPSYNC_VOLUME")]
    pub volume: Option<f32>,

    /// Locale preferred when picking a voice (e.g. en-GB)
    #[arg(long, global = true, env = "LIPSYNC_LOCALE")]
    pub locale: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "lipsync",
            "--rate",
            "1.5",
            "--backend",
            "simulated",
            "say",
            "Hi",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.rate, Some(1.5));
        assert_eq!(cli.backend, Some(BackendKind::Simulated));
        assert!(matches!(cli.command, Some(Commands::Say { .. })));
    }

    #[test]
    fn test_say_joins_words() {
        let cli = Cli::parse_from(["lipsync", "say", "Hello", "there", "--stop-after", "500"]);
        let Some(Commands::Say { text, stop_after }) = cli.command else {
            panic!("expected say");
        };
        assert_eq!(text.join(" "), "Hello there");
        assert_eq!(stop_after, Some(500));
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(Cli::try_parse_from(["lipsync", "--backend", "festival", "voices"]).is_err());
    }
}
