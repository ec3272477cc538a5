//! Bulk downloader for object storage buckets.
//!
//! This is a facade crate that re-exports functionality from the qdown
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use qdown_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DownloadConfig::load("download.conf")?;
//!     let pool = WorkerPool::new(10)?;
//!     let downloader = BatchDownloader::new(DownloadClient::with_defaults()?);
//!
//!     let summary = downloader.run(&pool, config).await?;
//!     println!("{} downloaded, {} failed", summary.succeeded, summary.failed);
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use qdown_types::*;

// Re-export zones and signing
pub use qdown_auth::{Credentials, SIGNED_URL_TTL, sign_url, sign_url_until};
pub use qdown_zones::{DEFAULT_ZONE, ZoneEndpoints, ZoneError, ZoneRegistry};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use qdown_fetch::{
    ClientConfig, DownloadClient, DownloadError, FileLister, ListError, ObjectLister,
    ObjectRequest, RsfLister, is_duplicate, local_path,
};

// Re-export batch orchestration
#[cfg(feature = "batch")]
pub use qdown_batch::{
    BatchDownloader, BatchError, DownloadJob, JobContext, MAX_THREADS, MIN_THREADS, PoolError,
    RunCounters, RunSummary, WaitGroup, WaitGuard, WorkerPool, listing_file_name,
    run_batch_download,
};

/// Prelude module for convenient imports.
///
/// ```
/// use qdown_lib::prelude::*;
/// ```
pub mod prelude {
    pub use qdown_types::{ConfigError, DownloadConfig, ListingEntry, Result};

    pub use qdown_auth::{Credentials, sign_url};
    pub use qdown_zones::ZoneRegistry;

    #[cfg(feature = "fetch")]
    pub use qdown_fetch::{
        ClientConfig, DownloadClient, FileLister, ObjectLister, RsfLister, is_duplicate,
    };

    #[cfg(feature = "batch")]
    pub use qdown_batch::{
        BatchDownloader, BatchError, RunCounters, RunSummary, WorkerPool, run_batch_download,
    };
}
