//! Object request URL construction.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use qdown_auth::{Credentials, sign_url};
use qdown_types::DownloadConfig;

/// Characters escaped in an object key when it is placed in a URL path.
///
/// `/` is kept so the key hierarchy stays visible in the path.
const KEY_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A fully resolved request for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRequest {
    /// URL actually requested, pointing at the proxy endpoint.
    pub url: String,
    /// Value of the `Host` header: the bucket domain without scheme.
    pub host: String,
}

impl ObjectRequest {
    /// Resolves the request for `key` under `config`, routed through `proxy_endpoint`.
    ///
    /// The URL is `http://<host>/<key>`, signed when the bucket is private,
    /// then rewritten so that scheme and host point at `proxy_endpoint` while
    /// path and query are preserved.
    ///
    /// # Example
    ///
    /// ```
    /// use qdown_fetch::ObjectRequest;
    /// use qdown_types::DownloadConfig;
    ///
    /// let config = DownloadConfig::from_json(r#"{
    ///     "dest_dir": "/tmp/backup", "bucket": "b", "domain": "https://cdn.example.com",
    ///     "access_key": "ak", "secret_key": "sk"
    /// }"#).unwrap();
    ///
    /// let request = ObjectRequest::build(&config, "a/b.mp4", "http://iovip.qbox.me");
    /// assert_eq!(request.url, "http://iovip.qbox.me/a/b.mp4");
    /// assert_eq!(request.host, "cdn.example.com");
    /// ```
    #[must_use]
    pub fn build(config: &DownloadConfig, key: &str, proxy_endpoint: &str) -> Self {
        let host = config.request_host();
        let mut url = object_url(host, key);
        if config.is_private {
            let credentials = Credentials::new(&config.access_key, &config.secret_key);
            url = sign_url(&url, &credentials);
        }
        Self {
            url: through_proxy(&url, host, proxy_endpoint),
            host: host.to_string(),
        }
    }
}

/// Returns the unsigned public URL of `key` on `host`.
#[must_use]
pub fn object_url(host: &str, key: &str) -> String {
    format!("http://{host}/{}", utf8_percent_encode(key, KEY_ESCAPE))
}

/// Rewrites the `http://<host>` origin of `url` to `proxy_endpoint`.
///
/// URLs with a different origin are returned unchanged.
#[must_use]
pub fn through_proxy(url: &str, host: &str, proxy_endpoint: &str) -> String {
    let origin = format!("http://{host}");
    url.strip_prefix(&origin).map_or_else(
        || url.to_string(),
        |rest| format!("{}{rest}", proxy_endpoint.trim_end_matches('/')),
    )
}
