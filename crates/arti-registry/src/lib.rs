//! Artifactory registry access for the arti package manager.
//!
//! This crate covers the metadata half of resolution: the HTTP client
//! primitives, registry address selection, Git ref advertisement parsing,
//! the memoizing ref cache, layered ref/tag/version listing and the
//! conditional freshness check.

pub mod address;
pub mod cache;
pub mod client;
pub mod freshness;
pub mod refs;
pub mod versions;

// Re-export main types
pub use address::{RegistryAddress, REGISTRY_MARKER};
pub use cache::{MemoMap, RefCache};
pub use client::RegistryClient;
pub use refs::{RefEntry, VersionEntry};
pub use versions::VersionResolver;

use arti_core::ArtiError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, ArtiError>;
