//! Signed download URLs for private buckets.

use chrono::{TimeDelta, Utc};

use crate::Credentials;

/// Lifetime of a signed download URL, in seconds.
pub const SIGNED_URL_TTL: i64 = 24 * 3600;

/// Signs `base_url` so that it stays valid for [`SIGNED_URL_TTL`] seconds from now.
///
/// See [`sign_url_until`] for the URL format.
#[must_use]
pub fn sign_url(base_url: &str, credentials: &Credentials) -> String {
    let deadline = (Utc::now() + TimeDelta::seconds(SIGNED_URL_TTL)).timestamp();
    sign_url_until(base_url, credentials, deadline)
}

/// Signs `base_url` with an explicit expiry given in unix seconds.
///
/// Appends `e=<deadline>` and then `token=<access_key>:<signature>`, where the
/// signature covers the URL including the `e` parameter.
///
/// # Example
///
/// ```
/// use qdown_auth::{Credentials, sign_url_until};
///
/// let creds = Credentials::new("ak", "sk");
/// let url = sign_url_until("http://cdn.example.com/a/b.mp4", &creds, 1_700_000_000);
/// assert!(url.starts_with("http://cdn.example.com/a/b.mp4?e=1700000000&token=ak:"));
/// ```
#[must_use]
pub fn sign_url_until(base_url: &str, credentials: &Credentials, deadline: i64) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let url = format!("{base_url}{separator}e={deadline}");
    let token = credentials.sign(url.as_bytes());
    format!("{url}&token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://cdn.example.com/a/b.mp4";

    fn creds() -> Credentials {
        Credentials::new("ak", "sk")
    }

    #[test]
    fn test_signed_url_parameters_in_order() {
        let url = sign_url_until(BASE, &creds(), 1_700_000_000);
        let query = url.strip_prefix(BASE).unwrap().strip_prefix('?').unwrap();
        let params: Vec<_> = query.split('&').collect();

        assert_eq!(params.len(), 2);
        assert_eq!(params[0], "e=1700000000");
        assert!(params[1].starts_with("token=ak:"));
        assert_eq!(url.matches("?e=").count() + url.matches("&e=").count(), 1);
        assert_eq!(url.matches("&token=").count(), 1);
    }

    #[test]
    fn test_token_covers_expiry() {
        let url = sign_url_until(BASE, &creds(), 1_700_000_000);
        let expected = creds().sign(format!("{BASE}?e=1700000000").as_bytes());
        assert!(url.ends_with(&format!("&token={expected}")));
    }

    #[test]
    fn test_token_changes_with_base_url() {
        let token_of = |url: &str| {
            let signed = sign_url_until(url, &creds(), 1_700_000_000);
            signed.rsplit("token=").next().unwrap().to_string()
        };
        assert_ne!(token_of(BASE), token_of("http://cdn.example.com/a/b.mp5"));
        assert_ne!(token_of(BASE), token_of("http://cdn.example.com/a/B.mp4"));
    }

    #[test]
    fn test_token_changes_with_deadline() {
        let a = sign_url_until(BASE, &creds(), 1);
        let b = sign_url_until(BASE, &creds(), 2);
        assert_ne!(a.rsplit("token=").next(), b.rsplit("token=").next());
    }

    #[test]
    fn test_existing_query_uses_ampersand() {
        let url = sign_url_until("http://cdn.example.com/a?imageView2/1", &creds(), 5);
        assert!(url.starts_with("http://cdn.example.com/a?imageView2/1&e=5&token="));
    }

    #[test]
    fn test_sign_url_expires_in_a_day() {
        let before = Utc::now().timestamp() + SIGNED_URL_TTL;
        let url = sign_url(BASE, &creds());
        let after = Utc::now().timestamp() + SIGNED_URL_TTL;

        let e: i64 = url
            .split("?e=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(e >= before && e <= after);
    }
}
