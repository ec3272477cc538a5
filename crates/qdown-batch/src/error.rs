//! Errors that abort a whole batch run.

use qdown_fetch::ListError;
use qdown_types::ConfigError;
use qdown_zones::ZoneError;
use std::path::PathBuf;
use thiserror::Error;

use crate::PoolError;

/// Fatal errors of a batch run. Nothing is downloaded after one of these.
///
/// Per-object failures are never reported here; they are counted in the
/// run summary instead.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured zone is unknown.
    #[error("{0}, download halted")]
    Zone(#[from] ZoneError),

    /// Listing the bucket failed.
    #[error("List bucket error: {0}")]
    List(#[from] ListError),

    /// The listing artifact could not be created or read.
    #[error("Listing artifact '{path}': {source}")]
    Listing {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The worker pool rejected the run.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
