//! Worker pool and batch orchestration for the qdown bucket downloader.
//!
//! - [`WorkerPool`] - Fixed set of workers draining a bounded job queue
//! - [`WaitGroup`] - Completion barrier for the jobs of one run
//! - [`RunCounters`] / [`RunSummary`] - Concurrent run accounting
//! - [`DownloadJob`] - One object to fetch, runnable without a pool
//! - [`BatchDownloader`] - Listing, filtering, deduplication and dispatch
//! - [`run_batch_download`] - One-shot entry point from a config file

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod batch;
mod counters;
mod error;
mod job;
mod pool;
mod wait;

pub use batch::{BatchDownloader, listing_file_name, run_batch_download};
pub use counters::{RunCounters, RunSummary};
pub use error::BatchError;
pub use job::{DownloadJob, JobContext};
pub use pool::{MAX_THREADS, MIN_THREADS, PoolError, WorkerPool};
pub use wait::{WaitGroup, WaitGuard};
