//! Bucket listing collaborators.
//!
//! A lister enumerates a bucket (optionally below a prefix) and writes the
//! result to a local artifact, one object per line:
//!
//! ```text
//! key \t fsize \t hash \t putTime \t mimeType \t endUser
//! ```
//!
//! The artifact is then read back line by line by the batch orchestrator.

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use qdown_auth::Credentials;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Page size requested from the listing service.
pub const LIST_PAGE_LIMIT: usize = 1000;

/// Errors that can occur while listing a bucket.
#[derive(Error, Debug)]
pub enum ListError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Listing service answered with an error status.
    #[error("Listing failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, usually a JSON error message.
        body: String,
    },

    /// Listing response could not be decoded.
    #[error("Invalid listing response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the listing artifact failed.
    #[error("Listing artifact '{path}': {source}")]
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Produces a bucket listing artifact.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Lists `bucket` below `prefix` into the file at `output`.
    ///
    /// Returns the number of objects written.
    async fn list(&self, bucket: &str, prefix: &str, output: &Path) -> Result<u64, ListError>;
}

/// Lists buckets through the paginated `/list` endpoint of the listing host.
#[derive(Debug, Clone)]
pub struct RsfLister {
    client: Client,
    rsf_host: String,
    credentials: Credentials,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    marker: String,
    #[serde(default)]
    items: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    key: String,
    fsize: i64,
    #[serde(default)]
    hash: String,
    #[serde(rename = "putTime", default)]
    put_time: i64,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(rename = "endUser", default)]
    end_user: String,
}

impl ListItem {
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            self.key, self.fsize, self.hash, self.put_time, self.mime_type, self.end_user
        )
    }
}

impl RsfLister {
    /// Creates a lister talking to `rsf_host` with the given credentials.
    #[must_use]
    pub fn new(client: Client, rsf_host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            rsf_host: rsf_host.into().trim_end_matches('/').to_string(),
            credentials,
            limit: LIST_PAGE_LIMIT,
        }
    }

    /// Sets the page size requested per call.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    async fn fetch_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
    ) -> Result<ListPage, ListError> {
        let mut path = format!(
            "/list?bucket={}&limit={}",
            utf8_percent_encode(bucket, NON_ALPHANUMERIC),
            self.limit
        );
        if !prefix.is_empty() {
            path.push_str("&prefix=");
            path.extend(utf8_percent_encode(prefix, NON_ALPHANUMERIC));
        }
        if !marker.is_empty() {
            path.push_str("&marker=");
            path.extend(utf8_percent_encode(marker, NON_ALPHANUMERIC));
        }

        let response = self
            .client
            .post(format!("{}{path}", self.rsf_host))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(AUTHORIZATION, self.credentials.management_token(&path, None))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ListError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ObjectLister for RsfLister {
    async fn list(&self, bucket: &str, prefix: &str, output: &Path) -> Result<u64, ListError> {
        let io_err = |e| ListError::Io {
            path: output.to_path_buf(),
            source: e,
        };
        let file = File::create(output).await.map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let mut marker = String::new();
        let mut count = 0u64;

        loop {
            let page = self.fetch_page(bucket, prefix, &marker).await?;
            for item in &page.items {
                writer
                    .write_all(item.to_line().as_bytes())
                    .await
                    .map_err(io_err)?;
            }
            count += page.items.len() as u64;
            debug!(bucket, objects = count, "listed page");

            if page.marker.is_empty() {
                break;
            }
            marker = page.marker;
        }

        writer.flush().await.map_err(io_err)?;
        info!(bucket, prefix, objects = count, "bucket listed");
        Ok(count)
    }
}

/// Uses an existing listing file instead of querying the service.
///
/// The file is copied to the requested artifact path; `bucket` and `prefix`
/// are not applied to its contents.
#[derive(Debug, Clone)]
pub struct FileLister {
    source: PathBuf,
}

impl FileLister {
    /// Creates a lister replaying the listing stored at `source`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl ObjectLister for FileLister {
    async fn list(&self, _bucket: &str, _prefix: &str, output: &Path) -> Result<u64, ListError> {
        if self.source != output {
            tokio::fs::copy(&self.source, output)
                .await
                .map_err(|e| ListError::Io {
                    path: self.source.clone(),
                    source: e,
                })?;
        }
        let content = tokio::fs::read_to_string(output)
            .await
            .map_err(|e| ListError::Io {
                path: output.to_path_buf(),
                source: e,
            })?;
        Ok(content.lines().filter(|l| !l.trim().is_empty()).count() as u64)
    }
}
