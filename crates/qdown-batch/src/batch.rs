//! Batch orchestration: list, filter, skip local copies, dispatch, drain, report.

use directories::ProjectDirs;
use qdown_auth::Credentials;
use qdown_fetch::{ClientConfig, DownloadClient, ObjectLister, RsfLister, is_duplicate};
use qdown_types::{ConfigError, DownloadConfig, ListingEntry};
use qdown_zones::{ZoneError, ZoneRegistry};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::{BatchError, DownloadJob, JobContext, RunCounters, RunSummary, WaitGroup, WorkerPool};

/// Downloads every object of a bucket that is missing locally.
///
/// A run goes through these stages:
///
/// 1. Validate the zone and pick the proxy endpoint (zone IO host or
///    `io_host` override).
/// 2. List the bucket into a local artifact.
/// 3. For each well-formed listing line: apply the suffix filter, skip keys
///    whose local copy already has the listed size, and submit a job for the
///    rest to the worker pool.
/// 4. Wait until every submitted job has finished.
/// 5. Log and return the [`RunSummary`].
pub struct BatchDownloader {
    client: DownloadClient,
    listing_dir: PathBuf,
    lister: Option<Arc<dyn ObjectLister>>,
}

impl BatchDownloader {
    /// Creates a downloader using `client` for object requests.
    #[must_use]
    pub fn new(client: DownloadClient) -> Self {
        Self {
            client,
            listing_dir: Self::default_listing_dir(),
            lister: None,
        }
    }

    /// Sets the directory listing artifacts are written to.
    #[must_use]
    pub fn with_listing_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.listing_dir = dir.into();
        self
    }

    /// Replaces the zone's listing service with `lister`.
    #[must_use]
    pub fn with_lister(mut self, lister: Arc<dyn ObjectLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    /// Returns the directory listing artifacts are written to.
    #[must_use]
    pub fn listing_dir(&self) -> &Path {
        &self.listing_dir
    }

    /// Returns the default listing directory.
    ///
    /// Uses the platform cache directory for `qdown`, falling back to the
    /// current working directory.
    #[must_use]
    pub fn default_listing_dir() -> PathBuf {
        ProjectDirs::from("", "", "qdown")
            .map_or_else(|| PathBuf::from("."), |dirs| dirs.cache_dir().to_path_buf())
    }

    /// Runs one batch on `pool` with fresh counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone is invalid, the listing cannot be
    /// produced or read, or the pool is closed. Failures of single objects
    /// are counted in the summary instead.
    pub async fn run(
        &self,
        pool: &WorkerPool,
        config: DownloadConfig,
    ) -> Result<RunSummary, BatchError> {
        self.run_with_counters(pool, config, Arc::new(RunCounters::new()))
            .await
    }

    /// Runs one batch on `pool`, recording into caller-owned `counters`.
    ///
    /// Useful to observe progress while the run is in flight.
    ///
    /// # Errors
    ///
    /// See [`BatchDownloader::run`].
    pub async fn run_with_counters(
        &self,
        pool: &WorkerPool,
        config: DownloadConfig,
        counters: Arc<RunCounters>,
    ) -> Result<RunSummary, BatchError> {
        let started = Instant::now();

        let registry = ZoneRegistry::global();
        if let Some(zone) = config.zone()
            && !registry.is_valid(zone)
        {
            return Err(ZoneError(zone.to_string()).into());
        }
        let endpoints = registry.resolve(&config.zone)?;
        let proxy_endpoint = config
            .io_host
            .clone()
            .unwrap_or_else(|| endpoints.io.clone());
        debug!(zone = %endpoints.name, proxy = %proxy_endpoint, "endpoints selected");

        fs::create_dir_all(&self.listing_dir)
            .await
            .map_err(|e| BatchError::Listing {
                path: self.listing_dir.clone(),
                source: e,
            })?;
        let listing_path = self.listing_dir.join(listing_file_name(&config)?);

        info!("List bucket ...");
        let lister: Arc<dyn ObjectLister> = match &self.lister {
            Some(lister) => Arc::clone(lister),
            None => Arc::new(RsfLister::new(
                reqwest::Client::new(),
                &endpoints.rsf,
                Credentials::new(&config.access_key, &config.secret_key),
            )),
        };
        lister
            .list(&config.bucket, &config.prefix, &listing_path)
            .await?;

        let context = Arc::new(JobContext {
            client: self.client.clone(),
            config,
            proxy_endpoint,
        });
        let wait_group = WaitGroup::new();

        let enqueued = self
            .enqueue(pool, &listing_path, context, &wait_group, &counters)
            .await;
        // Jobs already handed to the pool are drained even if enqueuing stopped early.
        wait_group.wait().await;
        enqueued?;

        let summary = counters.snapshot(started.elapsed());
        summary.log();
        Ok(summary)
    }

    async fn enqueue(
        &self,
        pool: &WorkerPool,
        listing_path: &Path,
        context: Arc<JobContext>,
        wait_group: &WaitGroup,
        counters: &Arc<RunCounters>,
    ) -> Result<(), BatchError> {
        let listing_err = |e| BatchError::Listing {
            path: listing_path.to_path_buf(),
            source: e,
        };
        let file = File::open(listing_path).await.map_err(listing_err)?;
        let mut lines = BufReader::new(file).lines();

        while let Some(line) = lines.next_line().await.map_err(listing_err)? {
            let Some(entry) = ListingEntry::parse(&line) else {
                continue;
            };
            counters.record_listed();

            if !context.config.matches_suffix(&entry.key) {
                counters.record_filtered();
                continue;
            }
            counters.record_considered();

            if is_duplicate(&context.config.dest_dir, &entry.key, entry.size).await {
                debug!(key = %entry.key, "local copy up to date");
                counters.record_local();
                continue;
            }

            let guard = wait_group.add();
            let job = DownloadJob::new(entry, Arc::clone(&context));
            let counters = Arc::clone(counters);
            pool.submit(async move {
                let _guard = guard;
                job.run(&counters).await;
            })
            .await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for BatchDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDownloader")
            .field("client", &self.client)
            .field("listing_dir", &self.listing_dir)
            .field("custom_lister", &self.lister.is_some())
            .finish()
    }
}

/// Returns the listing artifact file name for `config`.
///
/// The name is derived from a digest of the serialized configuration, so
/// runs with identical configurations share one artifact.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn listing_file_name(config: &DownloadConfig) -> Result<String, ConfigError> {
    let digest = Sha256::digest(config.to_json()?.as_bytes());
    Ok(format!("{}.list.txt", hex::encode(&digest[..16])))
}

/// Loads the configuration at `config_path` and downloads the bucket with
/// `thread_count` workers.
///
/// The thread count is clamped into
/// [`MIN_THREADS`](crate::MIN_THREADS)`..=`[`MAX_THREADS`](crate::MAX_THREADS).
/// A fresh pool is created for this call and shut down afterwards; callers
/// running several batches in one process should keep one [`WorkerPool`] and
/// use [`BatchDownloader::run`] directly.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the run aborts;
/// see [`BatchDownloader::run`].
pub async fn run_batch_download(
    thread_count: usize,
    config_path: impl AsRef<Path>,
) -> Result<RunSummary, BatchError> {
    let config = DownloadConfig::load(config_path)?;

    let threads = WorkerPool::clamp_size(thread_count);
    if threads != thread_count {
        warn!(requested = thread_count, using = threads, "thread count clamped");
    }
    let pool = WorkerPool::new(threads)?;
    let client = DownloadClient::new(ClientConfig {
        pool_max_idle_per_host: threads,
        ..Default::default()
    })?;

    let result = BatchDownloader::new(client).run(&pool, config).await;
    pool.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> DownloadConfig {
        DownloadConfig::from_json(
            r#"{
                "dest_dir": "/tmp/backup",
                "bucket": "bucket",
                "domain": "cdn.example.com",
                "access_key": "ak",
                "secret_key": "sk"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_listing_file_name_stable() {
        let name = listing_file_name(&config()).unwrap();
        assert_eq!(name, listing_file_name(&config()).unwrap());
        assert!(name.ends_with(".list.txt"));
        assert_eq!(name.len(), 32 + ".list.txt".len());
    }

    #[test]
    fn test_listing_file_name_depends_on_config() {
        let mut other = config();
        other.prefix = "demo/".to_string();
        assert_ne!(
            listing_file_name(&config()).unwrap(),
            listing_file_name(&other).unwrap()
        );
    }

    #[tokio::test]
    async fn test_run_batch_download_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = run_batch_download(4, temp_dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Config(ConfigError::Read { .. })));
    }

    #[tokio::test]
    async fn test_run_batch_download_invalid_zone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("download.conf");
        std::fs::write(
            &path,
            r#"{
                "dest_dir": "/tmp/backup", "bucket": "bucket", "domain": "cdn.example.com",
                "access_key": "ak", "secret_key": "sk", "zone": "mars"
            }"#,
        )
        .unwrap();

        let err = run_batch_download(4, &path).await.unwrap_err();
        assert!(matches!(err, BatchError::Zone(ZoneError(ref z)) if z == "mars"));
    }
}
