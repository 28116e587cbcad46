//! Standalone ref/tag/version queries.
//!
//! Version-resolution consumers outside a single package fetch (e.g.
//! the host's interactive version picker) go through these functions.
//! Each call builds a resolver from the ambient configuration but
//! shares the process-wide ref cache, so repeated queries for one
//! source cost one metadata round-trip per TTL window.

use std::collections::BTreeMap;

use arti_config::Config;
use arti_core::ArtiResult;
use arti_registry::{RegistryAddress, RegistryClient, VersionEntry, VersionResolver};

fn resolver_from(config: &Config) -> ArtiResult<VersionResolver> {
    let client = RegistryClient::new(config)?;
    let address = RegistryAddress::from_config(config)?;
    Ok(VersionResolver::new(client, address))
}

/// Raw ref advertisement lines for a source.
pub async fn list_refs(source: &str, config: &Config) -> ArtiResult<Vec<String>> {
    resolver_from(config)?.refs(source).await
}

/// Tag name -> commit map for a source.
pub async fn list_tags(source: &str, config: &Config) -> ArtiResult<BTreeMap<String, String>> {
    resolver_from(config)?.tags(source).await
}

/// Branch name -> commit map for a source.
pub async fn list_branches(source: &str, config: &Config) -> ArtiResult<BTreeMap<String, String>> {
    resolver_from(config)?.branches(source).await
}

/// Semantic versions for a source, sorted descending.
pub async fn list_versions(source: &str, config: &Config) -> ArtiResult<Vec<VersionEntry>> {
    resolver_from(config)?.versions(source).await
}
