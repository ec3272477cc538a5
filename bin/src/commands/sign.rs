//! Sign command implementation.

use anyhow::{Context, Result};
use qdown_lib::{Credentials, DownloadConfig, sign_url, sign_url_until};
use std::path::Path;

/// Print `url` signed with the credentials of the configuration at `config_path`.
pub(crate) fn sign(config_path: &Path, url: &str, deadline: Option<i64>) -> Result<()> {
    let config = DownloadConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let credentials = Credentials::new(&config.access_key, &config.secret_key);

    let signed = match deadline {
        Some(deadline) => sign_url_until(url, &credentials, deadline),
        None => sign_url(url, &credentials),
    };
    println!("{signed}");
    Ok(())
}
