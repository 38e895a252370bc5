//! `load-counties` command: import county boundaries.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use finder_data::CountyImport;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COUNTIES_PATH, ARG_DATABASE, CliError, ENV_COUNTIES_PATH, database_path, open_store,
};

/// CLI arguments for the `load-counties` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load-counties",
    long_about = "Replace the stored county boundaries with those in a \
                 GeoJSON export in Irish Transverse Mercator (EPSG:2157). \
                 Vertices are converted to WGS84 on import.",
    about = "Import county boundaries from an ITM GeoJSON export"
)]
#[ortho_config(prefix = "FINDER")]
pub(crate) struct LoadCountiesArgs {
    /// Path to the county GeoJSON export.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) path: Option<Utf8PathBuf>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl LoadCountiesArgs {
    pub(crate) fn into_config(self) -> Result<LoadCountiesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadCountiesConfig::try_from(merged)
    }
}

/// Resolved `load-counties` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadCountiesConfig {
    pub(crate) path: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl LoadCountiesConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.path, ARG_COUNTIES_PATH)
    }
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match finder_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl TryFrom<LoadCountiesArgs> for LoadCountiesConfig {
    type Error = CliError;

    fn try_from(args: LoadCountiesArgs) -> Result<Self, Self::Error> {
        let path = args.path.ok_or(CliError::MissingArgument {
            field: ARG_COUNTIES_PATH,
            env: ENV_COUNTIES_PATH,
        })?;
        Ok(Self {
            path,
            database: database_path(args.database),
        })
    }
}

pub(crate) fn run_load_counties(args: LoadCountiesArgs) -> Result<CountyImport, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let store = open_store(&config.database)?;
    let report = finder_data::load_counties(&store, &config.path)?;
    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        database = %config.database,
        "counties loaded"
    );
    Ok(report)
}
