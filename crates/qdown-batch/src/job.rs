//! A single object download as a value.

use futures::FutureExt;
use qdown_fetch::{DownloadClient, DownloadError};
use qdown_types::{DownloadConfig, ListingEntry};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

use crate::RunCounters;

/// State shared read-only by every job of a run.
#[derive(Debug)]
pub struct JobContext {
    /// HTTP client used for the object requests.
    pub client: DownloadClient,
    /// The run configuration.
    pub config: DownloadConfig,
    /// Endpoint every object request is sent to.
    pub proxy_endpoint: String,
}

/// One object to fetch into the destination tree.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Object key.
    pub key: String,
    /// Size reported by the listing.
    pub expected_size: u64,
    context: Arc<JobContext>,
}

impl DownloadJob {
    /// Creates a job for a listing entry.
    #[must_use]
    pub fn new(entry: ListingEntry, context: Arc<JobContext>) -> Self {
        Self {
            key: entry.key,
            expected_size: entry.size,
            context,
        }
    }

    /// Downloads the object, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the downloader's error; see [`DownloadClient::download`].
    pub async fn execute(&self) -> Result<u64, DownloadError> {
        let ctx = &self.context;
        ctx.client
            .download(&ctx.config, &self.key, &ctx.proxy_endpoint)
            .await
    }

    /// Executes the job and records its outcome in `counters`.
    ///
    /// A panic during the download is recorded as a failure.
    pub async fn run(self, counters: &RunCounters) {
        self.record(self.execute(), counters).await;
    }

    async fn record<F>(&self, attempt: F, counters: &RunCounters)
    where
        F: Future<Output = Result<u64, DownloadError>>,
    {
        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(written)) => {
                if written != self.expected_size {
                    warn!(
                        key = %self.key,
                        expected = self.expected_size,
                        written,
                        "downloaded size differs from listing"
                    );
                }
                counters.record_success();
            }
            // The client logs its own failures.
            Ok(Err(_)) => counters.record_failure(),
            Err(_) => {
                error!(key = %self.key, "download panicked");
                counters.record_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use std::time::Duration;
    use tempfile::TempDir;

    fn context(dest: &std::path::Path, proxy: String) -> Arc<JobContext> {
        let config = DownloadConfig {
            dest_dir: dest.to_path_buf(),
            bucket: "bucket".to_string(),
            domain: "cdn.example.com".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            is_private: false,
            prefix: String::new(),
            suffix: String::new(),
            referer: String::new(),
            zone: String::new(),
            io_host: None,
        };
        Arc::new(JobContext {
            client: DownloadClient::with_defaults().unwrap(),
            config,
            proxy_endpoint: proxy,
        })
    }

    #[tokio::test]
    async fn test_execute_without_pool() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/a/b.mp4"))
                .respond_with(status_code(200).body(vec![7u8; 1024])),
        );

        let temp_dir = TempDir::new().unwrap();
        let job = DownloadJob::new(
            ListingEntry::new("a/b.mp4", 1024),
            context(temp_dir.path(), format!("http://{}", server.addr())),
        );

        assert_eq!(job.execute().await.unwrap(), 1024);
        assert!(qdown_fetch::is_duplicate(temp_dir.path(), "a/b.mp4", 1024).await);
    }

    #[tokio::test]
    async fn test_run_records_outcomes() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/ok.txt"))
                .respond_with(status_code(200).body("ok")),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/denied.txt"))
                .respond_with(status_code(403)),
        );

        let temp_dir = TempDir::new().unwrap();
        let ctx = context(temp_dir.path(), format!("http://{}", server.addr()));
        let counters = RunCounters::new();

        DownloadJob::new(ListingEntry::new("ok.txt", 2), Arc::clone(&ctx))
            .run(&counters)
            .await;
        DownloadJob::new(ListingEntry::new("denied.txt", 10), ctx)
            .run(&counters)
            .await;

        let summary = counters.snapshot(Duration::ZERO);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!temp_dir.path().join("denied.txt").exists());
    }

    #[tokio::test]
    async fn test_unsafe_key_counts_as_failure() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(temp_dir.path(), "http://127.0.0.1:9".to_string());
        let counters = RunCounters::new();
        counters.record_listed();
        counters.record_considered();

        DownloadJob::new(ListingEntry::new("../escape.txt", 5), ctx)
            .run(&counters)
            .await;

        let summary = counters.snapshot(Duration::ZERO);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_balanced());
    }

    async fn panicking_attempt() -> Result<u64, DownloadError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panic_counts_as_failure() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(temp_dir.path(), "http://127.0.0.1:9".to_string());
        let counters = RunCounters::new();
        counters.record_listed();
        counters.record_considered();

        let job = DownloadJob::new(ListingEntry::new("a.txt", 1), ctx);
        job.record(panicking_attempt(), &counters).await;

        let summary = counters.snapshot(Duration::ZERO);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_balanced());
        assert!(!summary.is_success());
    }
}
