//! `seed` command: reset venues and sessions to the sample data set.

use camino::Utf8PathBuf;
use clap::Parser;
use finder_data::SeedReport;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, database_path, open_store};

/// CLI arguments for the `seed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "seed",
    long_about = "Delete every venue and session, then insert the sample \
                 venues and open games. County boundaries are kept.",
    about = "Reset venues and sessions to the sample data set"
)]
#[ortho_config(prefix = "FINDER")]
pub(crate) struct SeedArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<SeedReport, CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let database = database_path(merged.database);
    let store = open_store(&database)?;
    let report = finder_data::seed(&store).map_err(CliError::Seed)?;
    tracing::info!(
        venues = report.venues,
        sessions = report.sessions,
        %database,
        "sample data seeded"
    );
    Ok(report)
}
