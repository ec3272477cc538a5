//! Download run configuration.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for one bulk download run.
///
/// Loaded once from a JSON file and shared read-only by every worker:
///
/// ```json
/// {
///     "dest_dir"   : "/Users/jemy/Backup",
///     "bucket"     : "test-bucket",
///     "domain"     : "<Your bucket domain>",
///     "access_key" : "<Your AccessKey>",
///     "secret_key" : "<Your SecretKey>",
///     "is_private" : false,
///     "prefix"     : "demo/",
///     "suffix"     : ".mp4",
///     "referer"    : "",
///     "zone"       : ""
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Local directory the bucket hierarchy is mirrored into.
    pub dest_dir: PathBuf,
    /// Bucket to download.
    pub bucket: String,
    /// Public domain bound to the bucket, with or without a scheme.
    pub domain: String,
    /// Access key of the account owning the bucket.
    pub access_key: String,
    /// Secret key of the account owning the bucket.
    pub secret_key: String,
    /// Whether object URLs must be signed.
    #[serde(default)]
    pub is_private: bool,
    /// Only list keys starting with this prefix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    /// Only download keys ending with this suffix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    /// `Referer` header sent with every object request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referer: String,
    /// Zone name; empty selects the default zone.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,
    /// Overrides the zone's IO endpoint that object requests are proxied through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_host: Option<String>,
}

impl DownloadConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// leaves a required field empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_slice(&data).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a required field is empty.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the required fields are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyField`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        if self.dest_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("dest_dir"));
        }
        if self.bucket.is_empty() {
            return Err(ConfigError::EmptyField("bucket"));
        }
        if self.domain.is_empty() {
            return Err(ConfigError::EmptyField("domain"));
        }
        Ok(())
    }

    /// Returns the request host: the domain with any `scheme://` prefix removed.
    #[must_use]
    pub fn request_host(&self) -> &str {
        self.domain
            .find("://")
            .map_or(self.domain.as_str(), |idx| &self.domain[idx + 3..])
    }

    /// Returns true if `key` passes the suffix filter.
    #[must_use]
    pub fn matches_suffix(&self, key: &str) -> bool {
        self.suffix.is_empty() || key.ends_with(&self.suffix)
    }

    /// Returns the configured `Referer` value, if any.
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        Some(self.referer.as_str()).filter(|r| !r.is_empty())
    }

    /// Returns the configured zone name, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        Some(self.zone.as_str()).filter(|z| !z.is_empty())
    }

    /// Serializes the configuration to canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
