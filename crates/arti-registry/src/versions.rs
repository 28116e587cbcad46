//! Layered ref/tag/version listing over the memoizing cache.
//!
//! `versions` is derived from `tags` is derived from `refs`, each layer
//! memoized independently, so one successful metadata fetch satisfies
//! all of them until the TTL lapses.

use std::collections::BTreeMap;
use std::sync::Arc;

use arti_core::{ArtiError, PackageReference};

use crate::address::RegistryAddress;
use crate::cache::RefCache;
use crate::client::RegistryClient;
use crate::refs::{self, VersionEntry};
use crate::RegistryResult;

/// Lists refs, tags, branches and versions for package sources against
/// one registry, memoizing through a [`RefCache`].
#[derive(Clone)]
pub struct VersionResolver {
    client: RegistryClient,
    address: RegistryAddress,
    cache: Arc<RefCache>,
}

impl VersionResolver {
    /// Resolver backed by the process-wide shared cache
    pub fn new(client: RegistryClient, address: RegistryAddress) -> Self {
        Self::with_cache(client, address, RefCache::shared())
    }

    /// Resolver backed by a caller-provided cache (isolated in tests)
    pub fn with_cache(client: RegistryClient, address: RegistryAddress, cache: Arc<RefCache>) -> Self {
        Self {
            client,
            address,
            cache,
        }
    }

    /// Raw advertisement lines for a source, trimmed and non-empty.
    pub async fn refs(&self, source: &str) -> RegistryResult<Vec<String>> {
        let reference = PackageReference::parse(source)?;
        let url = self.address.refs_url(&reference)?;
        let client = self.client.clone();
        let target = format!("{}/{}", reference.org(), reference.repo());

        self.cache
            .refs
            .get_or_fetch(source, move || {
                fetch_advertisement(client, url, target)
            })
            .await
    }

    /// Tag name -> commit map derived from the advertisement.
    pub async fn tags(&self, source: &str) -> RegistryResult<BTreeMap<String, String>> {
        let resolver = self.clone();
        let key = source.to_string();

        self.cache
            .tags
            .get_or_fetch(source, move || async move {
                let lines = resolver.refs(&key).await?;
                Ok(refs::tags_from_lines(&lines))
            })
            .await
    }

    /// Branch name -> commit map derived from the advertisement.
    pub async fn branches(&self, source: &str) -> RegistryResult<BTreeMap<String, String>> {
        let resolver = self.clone();
        let key = source.to_string();

        self.cache
            .branches
            .get_or_fetch(source, move || async move {
                let lines = resolver.refs(&key).await?;
                Ok(refs::branches_from_lines(&lines))
            })
            .await
    }

    /// Semantic versions derived from the tags, sorted descending.
    pub async fn versions(&self, source: &str) -> RegistryResult<Vec<VersionEntry>> {
        let resolver = self.clone();
        let key = source.to_string();

        self.cache
            .versions
            .get_or_fetch(source, move || async move {
                let tags = resolver.tags(&key).await?;
                Ok(refs::versions_from_tags(&tags))
            })
            .await
    }
}

/// Fetch and split the ref advertisement. A status failure is re-raised
/// as "target does not exist" carrying the registry's own message, since
/// an unreachable advertisement means no ref of this package can be
/// resolved; transport failures stay typed as such.
async fn fetch_advertisement(
    client: RegistryClient,
    url: String,
    target: String,
) -> RegistryResult<Vec<String>> {
    match client.get_text(&url).await {
        Ok(body) => Ok(refs::advertisement_lines(&body)),
        Err(ArtiError::InvalidResponse { url, .. }) => {
            let details = client.error_message(&url).await;
            Err(ArtiError::TargetNotFound { target, details })
        }
        Err(other) => Err(other),
    }
}
