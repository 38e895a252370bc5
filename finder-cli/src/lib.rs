//! Command-line interface for running and populating the game finder.
#![forbid(unsafe_code)]

mod counties;
mod error;
mod seed;
mod serve;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use finder_core::SqliteGameStore;

pub use error::CliError;

use counties::LoadCountiesArgs;
use seed::SeedArgs;
use serve::ServeArgs;

const ARG_DATABASE: &str = "database";
const ARG_BIND: &str = "bind";
const ARG_COUNTIES_PATH: &str = "path";
const ENV_COUNTIES_PATH: &str = "FINDER_CMDS_LOAD_COUNTIES_PATH";

const DEFAULT_DATABASE: &str = "game-finder.db";
const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns argument, configuration, store and server failures.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    execute(cli.command)
}

fn execute(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve(args) => serve::run_serve(args),
        Command::LoadCounties(args) => counties::run_load_counties(args).map(|_| ()),
        Command::Seed(args) => seed::run_seed(args).map(|_| ()),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "game-finder",
    about = "Find tabletop wargaming sessions on a map of Ireland",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the REST API and map page.
    Serve(ServeArgs),
    /// Replace county boundaries from an ITM GeoJSON export.
    LoadCounties(LoadCountiesArgs),
    /// Reset venues and sessions to the sample data set.
    Seed(SeedArgs),
}

/// Database path after layering, falling back to the default file name.
fn database_path(configured: Option<Utf8PathBuf>) -> Utf8PathBuf {
    configured.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

/// Open the SQLite store, creating its directory on first use.
fn open_store(path: &Utf8Path) -> Result<SqliteGameStore, CliError> {
    finder_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareDatabaseDir {
        path: path.to_path_buf(),
        source,
    })?;
    SqliteGameStore::open(path.as_std_path()).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests;
