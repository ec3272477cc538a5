//! Zone endpoint registry for the qdown bucket downloader.
//!
//! A zone names a region of the storage service and selects which physical
//! hosts requests go to. The table is embedded at compile time.
//!
//! # Example
//!
//! ```
//! use qdown_zones::ZoneRegistry;
//!
//! let registry = ZoneRegistry::global();
//!
//! assert!(registry.is_valid("bc"));
//! let endpoints = registry.resolve("").unwrap();
//! assert_eq!(endpoints.name, "nb");
//! ```

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The zone table embedded at compile time.
const ZONES_JSON: &str = include_str!("../data/zones.json");

/// Zone selected when no zone name is configured.
pub const DEFAULT_ZONE: &str = "nb";

/// Global zone registry instance.
static REGISTRY: OnceLock<ZoneRegistry> = OnceLock::new();

/// Service hosts for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEndpoints {
    /// Zone name.
    pub name: String,
    /// Human readable region.
    pub description: String,
    /// IO host serving object downloads.
    pub io: String,
    /// Upload host.
    pub up: String,
    /// Resource management host.
    pub rs: String,
    /// Listing host.
    pub rsf: String,
    /// API host.
    pub api: String,
}

/// Error for unknown zone names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid zone `{0}`")]
pub struct ZoneError(pub String);

/// Registry of all known zones.
#[derive(Debug)]
pub struct ZoneRegistry {
    zones: HashMap<String, ZoneEndpoints>,
}

impl ZoneRegistry {
    /// Returns the global zone registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    fn load() -> Self {
        let zones: HashMap<String, ZoneEndpoints> =
            serde_json::from_str(ZONES_JSON).expect("Invalid zones.json");
        Self { zones }
    }

    /// Returns true if `name` is a known zone (case-insensitive).
    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.zones.contains_key(&name.to_lowercase())
    }

    /// Looks up a zone by name. An empty name selects [`DEFAULT_ZONE`].
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError`] if a non-empty name is not a known zone.
    pub fn resolve(&self, name: &str) -> Result<&ZoneEndpoints, ZoneError> {
        let key = if name.is_empty() {
            DEFAULT_ZONE.to_string()
        } else {
            name.to_lowercase()
        };
        self.zones.get(&key).ok_or_else(|| ZoneError(name.to_string()))
    }

    /// Returns all zones sorted by name.
    pub fn all(&self) -> Vec<&ZoneEndpoints> {
        let mut zones: Vec<_> = self.zones.values().collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        zones
    }

    /// Returns the number of known zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads() {
        let registry = ZoneRegistry::global();
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_empty_name_selects_default() {
        let registry = ZoneRegistry::global();
        let zone = registry.resolve("").unwrap();
        assert_eq!(zone.name, DEFAULT_ZONE);
        assert_eq!(zone.io, "http://iovip.qbox.me");
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let registry = ZoneRegistry::global();
        assert_eq!(registry.resolve("BC").unwrap().name, "bc");
        assert!(registry.is_valid("Na0"));
    }

    #[test]
    fn test_unknown_zone() {
        let registry = ZoneRegistry::global();
        assert!(!registry.is_valid("mars"));
        assert_eq!(
            registry.resolve("mars").unwrap_err(),
            ZoneError("mars".to_string())
        );
    }

    #[test]
    fn test_all_sorted() {
        let names: Vec<_> = ZoneRegistry::global()
            .all()
            .into_iter()
            .map(|z| z.name.as_str())
            .collect();
        assert_eq!(names, ["aws", "bc", "hn", "na0", "nb"]);
    }
}
