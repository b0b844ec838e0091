//! Error types emitted by the culvert CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use culvert_core::{FilterError, RepositoryError};
use culvert_pg::PgConnectError;
use culvert_validate::ValidatorError;
use thiserror::Error;

/// Errors emitted by the culvert CLI.
///
/// A missing required option is an error with a non-zero exit, not a silent
/// usage hint; the message names both the flag and the environment variable
/// that can supply it.
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
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// The change file could not be read.
    #[error("failed to read change file {path}: {source}")]
    ReadChangeFile {
        /// Path that was given.
        path: Utf8PathBuf,
        /// IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The `--area` ring text could not be parsed.
    #[error("could not parse area ring: {detail}")]
    InvalidAreaRing {
        /// What was wrong with the text.
        detail: String,
    },
    /// The assembled filter was rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// The validation engine rejected or failed the request.
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    /// Opening the PostGIS store failed.
    #[error(transparent)]
    OpenStore(#[from] PgConnectError),
    /// Query execution or shaping failed.
    #[error(transparent)]
    Query(#[from] RepositoryError),
    /// Serializing the output failed.
    #[error("failed to render output: {0}")]
    RenderOutput(#[source] serde_json::Error),
}
