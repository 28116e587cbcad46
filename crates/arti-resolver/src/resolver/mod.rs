//! Host resolver contract and its artifactory-backed implementation.
//!
//! The orchestrator drives three entry points per package: `resolve`
//! fetches the source tree into the session's working directory,
//! `has_new` answers "is there a newer version?" without downloading,
//! and `save_pkg_meta` enriches the metadata record the host persists.
//! The orchestrator calls `save_pkg_meta` only after `resolve` has
//! completed, but the implementation tolerates a missing response.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tempfile::TempDir;
use tracing::debug;

use arti_config::Config;
use arti_core::{ArtiError, ArtiResult, CacheHeaderSet, PackageReference};
use arti_fetch::{ArtifactFetcher, DownloadOutcome};
use arti_registry::{freshness, RegistryAddress, RegistryClient};

use crate::meta::PackageMeta;

/// Capability set the host orchestrator expects from a resolver.
#[async_trait]
pub trait Resolver: Send {
    /// Fetch the package into the session's working directory.
    async fn resolve(&mut self) -> ArtiResult<DownloadOutcome>;

    /// Whether a newer artifact exists than the one described by the
    /// previously persisted metadata.
    async fn has_new(&self, meta: &PackageMeta) -> bool;

    /// Enrich the metadata record before the host persists it.
    fn save_pkg_meta(&self, meta: PackageMeta) -> PackageMeta;
}

/// One resolution session against an artifactory registry.
///
/// Owns the parsed reference, the resolved registry address, the HTTP
/// client and a working directory that lives as long as the session.
#[derive(Debug)]
pub struct ArtifactoryResolver {
    reference: PackageReference,
    address: RegistryAddress,
    client: RegistryClient,
    fetcher: ArtifactFetcher,
    work_dir: TempDir,
    response_headers: Option<CacheHeaderSet>,
}

impl ArtifactoryResolver {
    pub fn new(source: &str, config: &Config) -> ArtiResult<Self> {
        let reference = PackageReference::parse(source)?;
        let address = RegistryAddress::from_config(config)?;
        let client = RegistryClient::new(config)?;
        let fetcher = ArtifactFetcher::new(client.clone());
        let work_dir = TempDir::new()
            .map_err(|e| ArtiError::io("failed to create working directory".to_string(), e))?;

        Ok(Self {
            reference,
            address,
            client,
            fetcher,
            work_dir,
            response_headers: None,
        })
    }

    pub fn reference(&self) -> &PackageReference {
        &self.reference
    }

    /// Directory the package is fetched into
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// HEAD the archive and collect its validator headers. A 404 is
    /// translated through the registry's JSON error body; other
    /// failures keep their taxonomy.
    async fn head_archive(&self, url: &str) -> ArtiResult<CacheHeaderSet> {
        match self.client.head(url, HeaderMap::new()).await {
            Ok(response) => Ok(CacheHeaderSet::collect(|name| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })),
            Err(ArtiError::InvalidResponse { url, status: 404 }) => {
                let details = self.client.error_message(&url).await;
                Err(ArtiError::TargetNotFound {
                    target: self.reference.target().to_string(),
                    details,
                })
            }
            Err(other) => Err(other),
        }
    }
}

#[async_trait]
impl Resolver for ArtifactoryResolver {
    async fn resolve(&mut self) -> ArtiResult<DownloadOutcome> {
        let url = self.address.archive_url(&self.reference)?;

        let headers = self.head_archive(&url).await?;
        debug!(%url, etag = headers.etag.as_deref(), "archive head succeeded");
        self.response_headers = Some(headers);

        self.fetcher
            .fetch_and_extract(&url, self.reference.target(), self.work_dir.path())
            .await
    }

    async fn has_new(&self, meta: &PackageMeta) -> bool {
        let Ok(url) = self.address.archive_url(&self.reference) else {
            return false;
        };
        let previous = meta.cache_headers.clone().unwrap_or_default();
        freshness::has_new(&self.client, &url, &previous).await
    }

    fn save_pkg_meta(&self, mut meta: PackageMeta) -> PackageMeta {
        if let Some(headers) = &self.response_headers {
            meta.release = headers.release_tag();
            meta.cache_headers = Some(headers.clone());
        }
        meta
    }
}
