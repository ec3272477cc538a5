//! HTTP object fetching and bucket listing for the qdown bucket downloader.
//!
//! This crate provides the per-object pipeline:
//!
//! - [`local_path`] / [`is_duplicate`] - Key to local path mapping and skip detection
//! - [`ObjectRequest`] - Request URL construction, signing and proxy rewrite
//! - [`DownloadClient`] - Streams one object into the destination tree
//! - [`ObjectLister`] - Writes a bucket listing to a local artifact

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod list;
mod local;
pub mod url;

pub use client::{ClientConfig, DownloadClient, DownloadError};
pub use list::{FileLister, ListError, ObjectLister, RsfLister};
pub use local::{is_duplicate, local_path};
pub use url::ObjectRequest;
