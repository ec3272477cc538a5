//! CLI command implementations.

pub(crate) mod download;
pub(crate) mod sign;
pub(crate) mod zones;
