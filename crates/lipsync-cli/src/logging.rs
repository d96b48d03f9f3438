//! Tracing setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` for our own crates
/// (`info` elsewhere) with `--verbose`. Logs go to stderr so they never mix with the avatar on
/// stdout.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,lipsync_core=debug,lipsync_voice=debug,lipsync_cli=debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok(); // Ignore error if already initialized
}
