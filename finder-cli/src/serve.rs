//! `serve` command: run the HTTP API over the SQLite store.

use std::net::SocketAddr;

use camino::Utf8PathBuf;
use clap::Parser;
use finder_server::AppState;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::{ARG_BIND, ARG_DATABASE, CliError, DEFAULT_BIND, database_path, open_store};

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "serve",
    long_about = "Serve the REST API and the map page. The database and \
                 bind address can come from CLI flags, configuration files, \
                 or environment variables.",
    about = "Serve the REST API and map page"
)]
#[ortho_config(prefix = "FINDER")]
pub(crate) struct ServeArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Socket address to listen on.
    #[arg(long = ARG_BIND, value_name = "addr")]
    #[serde(default)]
    pub(crate) bind: Option<String>,
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

/// Resolved `serve` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) bind: SocketAddr,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let address = args.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = address
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidAddress {
                field: ARG_BIND,
                address,
            })?;
        Ok(Self {
            database: database_path(args.database),
            bind,
        })
    }
}

pub(crate) fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let store = open_store(&config.database)?;
    tracing::info!(database = %config.database, "opened game store");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(async move {
        let listener =
            TcpListener::bind(config.bind)
                .await
                .map_err(|source| CliError::Bind {
                    address: config.bind.to_string(),
                    source,
                })?;
        finder_server::serve(listener, AppState::new(store))
            .await
            .map_err(CliError::Serve)
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ServeConfig, CliError> {
    let merged = ServeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ServeConfig::try_from(merged)
}
