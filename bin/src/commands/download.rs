//! Download command implementation.
//!
//! Mirrors a bucket into the configured destination directory with a fixed
//! number of concurrent downloads.

use crate::display::{progress_message, progress_spinner, track_progress};
use anyhow::{Context, Result, bail};
use qdown_lib::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Download every object of the configured bucket that is missing locally.
pub(crate) async fn download(
    config_path: &Path,
    threads: usize,
    list_dir: Option<PathBuf>,
    listing: Option<PathBuf>,
    timeout: Option<u64>,
    quiet: bool,
) -> Result<()> {
    let config = DownloadConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let pool_size = WorkerPool::clamp_size(threads);
    if pool_size != threads {
        warn!(requested = threads, using = pool_size, "thread count clamped");
    }

    // Create client
    let client = DownloadClient::new(ClientConfig {
        pool_max_idle_per_host: pool_size,
        timeout: timeout.map(Duration::from_secs),
        ..Default::default()
    })
    .context("Failed to build HTTP client")?;

    let mut downloader = BatchDownloader::new(client);
    if let Some(dir) = list_dir {
        downloader = downloader.with_listing_dir(dir);
    }
    if let Some(file) = listing {
        downloader = downloader.with_lister(Arc::new(FileLister::new(file)));
    }

    let pool = WorkerPool::new(pool_size)?;
    let counters = Arc::new(RunCounters::new());
    let spinner = progress_spinner(quiet)?;
    let tracker = tokio::spawn(track_progress(spinner.clone(), Arc::clone(&counters)));

    let result = downloader
        .run_with_counters(&pool, config, counters)
        .await;
    tracker.abort();
    pool.shutdown().await;

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            spinner.abandon_with_message("Download halted");
            return Err(e).context("Bucket download failed");
        }
    };
    spinner.finish_with_message(progress_message(&summary));

    if !summary.is_success() {
        bail!(
            "{} of {} downloads failed; run again to retry them",
            summary.failed,
            summary.attempted()
        );
    }
    Ok(())
}
