//! Core types for the qdown bucket downloader.
//!
//! This crate provides the data structures shared by the other qdown crates:
//!
//! - [`DownloadConfig`] - The JSON run configuration (bucket, domain, credentials, filters)
//! - [`ListingEntry`] - One `(key, size)` record parsed from a bucket listing line
//! - [`ConfigError`] - Errors raised while loading a configuration file

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod listing;

pub use config::DownloadConfig;
pub use error::{ConfigError, Result};
pub use listing::{LISTING_MIN_FIELDS, ListingEntry};
