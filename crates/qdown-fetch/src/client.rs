//! HTTP client for downloading single objects.

use futures::StreamExt;
use qdown_types::DownloadConfig;
use reqwest::header::{HOST, REFERER};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error};

use crate::{ObjectRequest, local_path};

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Idle connections kept per host; usually the worker count.
    pub pool_max_idle_per_host: usize,
    /// Whole-request timeout. `None` lets a request run indefinitely.
    pub timeout: Option<Duration>,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("qdown/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur while downloading one object.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The key cannot be mapped to a path inside the destination directory.
    #[error("Key `{0}` does not map to a path inside the destination directory")]
    UnsafeKey(String),

    /// Failed to create the parent directory of the local file.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with something other than `200 OK`.
    #[error("Unexpected status {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// Failed to write the local file.
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// HTTP client that mirrors single objects into a local directory tree.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            // Object bytes must land on disk exactly as stored.
            .gzip(false);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Downloads `key` into `config.dest_dir`, routed through `proxy_endpoint`.
    ///
    /// Parent directories are created first. The local file is created (or
    /// truncated) only after the server answers `200 OK`, and is removed again
    /// if streaming the body fails. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error on directory creation failure, network failure, any
    /// status other than 200, or a local write failure. Nothing is retried.
    pub async fn download(
        &self,
        config: &DownloadConfig,
        key: &str,
        proxy_endpoint: &str,
    ) -> Result<u64, DownloadError> {
        let Some(path) = local_path(&config.dest_dir, key) else {
            error!(key, "key escapes the destination directory");
            return Err(DownloadError::UnsafeKey(key.to_string()));
        };
        if let Some(parent) = path.parent() {
            create_parent_dir(parent).await.inspect_err(|e| {
                error!(dir = %parent.display(), error = %e, "create directory failed");
            })?;
        }

        debug!("Downloading {key} => {} ...", path.display());
        let request = ObjectRequest::build(config, key, proxy_endpoint);

        let mut builder = self.client.get(&request.url).header(HOST, &request.host);
        if let Some(referer) = config.referer() {
            builder = builder.header(REFERER, referer);
        }

        let response = builder.send().await.inspect_err(|e| {
            error!(key, url = %request.url, error = %e, "download request failed");
        })?;

        if response.status() != StatusCode::OK {
            error!(key, url = %request.url, status = %response.status(), "download failed");
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
                url: request.url,
            });
        }

        match write_body(response, &path).await {
            Ok(written) => {
                debug!(key, bytes = written, "download complete");
                Ok(written)
            }
            Err(e) => {
                error!(key, path = %path.display(), error = %e, "download failed");
                // No partial file may survive a failed download.
                let _ = fs::remove_file(&path).await;
                Err(e)
            }
        }
    }
}

async fn create_parent_dir(dir: &Path) -> Result<(), DownloadError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o775);
    builder
        .create(dir)
        .await
        .map_err(|e| DownloadError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64, DownloadError> {
    let write_err = |e| DownloadError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).await.map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let mut body = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    writer.flush().await.map_err(write_err)?;

    Ok(written)
}
