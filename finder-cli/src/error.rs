//! Error types emitted by the game finder CLI.

use std::{io, sync::Arc};

use camino::Utf8PathBuf;
use finder_core::StoreError;
use finder_data::CountyImportError;
use thiserror::Error;

/// Errors emitted by the game finder CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The directory holding the database could not be created.
    #[error("failed to create the directory for database {path:?}: {source}")]
    PrepareDatabaseDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Opening or migrating the database failed.
    #[error("failed to open database {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// Importing county boundaries failed.
    #[error("failed to load counties: {0}")]
    LoadCounties(#[from] CountyImportError),
    /// Writing the sample data failed.
    #[error("failed to seed sample data: {0}")]
    Seed(#[source] StoreError),
    /// The bind address is not a valid socket address.
    #[error("invalid {field} address {address:?}")]
    InvalidAddress {
        field: &'static str,
        address: String,
    },
    /// Building the async runtime failed.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] io::Error),
    /// Binding the listening socket failed.
    #[error("failed to listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// The server stopped with an IO error.
    #[error("server failed: {0}")]
    Serve(#[source] io::Error),
}
