//! Entry point for the `game-finder` binary.
#![forbid(unsafe_code)]

use finder_cli::CliError;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("game-finder: failed to initialise logging: {err}");
    }
    match finder_cli::run() {
        Ok(()) => {}
        // Help and version output go through clap.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("game-finder: {err}");
            std::process::exit(1);
        }
    }
}
