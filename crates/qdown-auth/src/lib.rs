//! Request signing and private URL signing for the qdown bucket downloader.
//!
//! - [`Credentials`] - Access/secret key pair and the HMAC-SHA1 signing primitive
//! - [`sign_url`] - Time-limited download URL for private buckets
//! - [`sign_url_until`] - Same, with an explicit expiry timestamp

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod credentials;
mod url;

pub use credentials::Credentials;
pub use url::{SIGNED_URL_TTL, sign_url, sign_url_until};
