//! CLI entry point - the composition root.
//!
//! Configuration is resolved and the speech backend wired here via
//! bootstrap; command dispatch routes to handlers.

use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};

use lipsync_cli::config::load_dotenv;
use lipsync_cli::logging::init_tracing;
use lipsync_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env first so clap sees LIPSYNC_* from it
    let dotenv = load_dotenv()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    // No command provided - show help
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::resolve(&cli)?;
    let ctx = bootstrap(config)?;

    match command {
        Commands::Say { text, stop_after } => {
            let stop_after = stop_after.map(Duration::from_millis);
            handlers::say::execute(&ctx, &text.join(" "), stop_after).await?;
        }
        Commands::Voices => {
            handlers::voices::execute(&ctx)?;
        }
        Commands::Interactive => {
            handlers::interactive::execute(&ctx).await?;
        }
    }

    Ok(())
}
