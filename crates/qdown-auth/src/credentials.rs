//! Account credentials and the token signing primitive.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Access key / secret key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Creates credentials from an access key and a secret key.
    #[must_use]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Returns the access key.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Signs `data`, producing a token of the form `<access_key>:<signature>`.
    ///
    /// The signature is the URL-safe base64 of HMAC-SHA1 over `data` keyed
    /// with the secret key.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> String {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(data);
        let digest = mac.finalize().into_bytes();
        format!("{}:{}", self.access_key, URL_SAFE.encode(digest))
    }

    /// Builds the `Authorization` header value for a management request.
    ///
    /// The signed payload is `path_and_query` followed by a newline, then the
    /// form-encoded body if there is one.
    #[must_use]
    pub fn management_token(&self, path_and_query: &str, form_body: Option<&[u8]>) -> String {
        let mut data = Vec::with_capacity(path_and_query.len() + 1);
        data.extend_from_slice(path_and_query.as_bytes());
        data.push(b'\n');
        if let Some(body) = form_body {
            data.extend_from_slice(body);
        }
        format!("QBox {}", self.sign(&data))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_known_vector() {
        // HMAC-SHA1("key", "The quick brown fox jumps over the lazy dog")
        // = de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9
        let creds = Credentials::new("ak", "key");
        let token = creds.sign(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(token, "ak:3nybhbi3iqa8ino29wqQcBydtNk=");
    }

    #[test]
    fn test_sign_is_url_safe() {
        let creds = Credentials::new("ak", "secret");
        for i in 0..64 {
            let token = creds.sign(format!("payload-{i}").as_bytes());
            let signature = token.strip_prefix("ak:").unwrap();
            assert!(!signature.contains('+'));
            assert!(!signature.contains('/'));
        }
    }

    #[test]
    fn test_management_token() {
        let creds = Credentials::new("ak", "sk");
        let token = creds.management_token("/list?bucket=b", None);
        assert_eq!(token, format!("QBox {}", creds.sign(b"/list?bucket=b\n")));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("ak", "very-secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("ak"));
        assert!(!debug.contains("very-secret"));
    }
}
