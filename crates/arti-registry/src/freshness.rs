//! Conditional freshness check against the archive endpoint.

use reqwest::header::{HeaderMap, HeaderValue, IF_NONE_MATCH};
use tracing::warn;

use arti_core::{ArtiError, CacheHeaderSet};

use crate::client::RegistryClient;

/// Whether a newer artifact exists than the one described by the
/// previously persisted cache headers.
///
/// Issues a HEAD against the archive URL, attaching `If-None-Match`
/// when an ETag was recorded. A 2xx means the artifact is present or
/// changed; `304 Not Modified` means it is unchanged. Every other
/// failure also reports "no update": an ambiguous outage must not make
/// the host re-download, so it is logged and collapsed to `false`.
pub async fn has_new(
    client: &RegistryClient,
    url: &str,
    previous: &CacheHeaderSet,
) -> bool {
    let mut headers = HeaderMap::new();
    if let Some(etag) = previous.etag.as_deref() {
        if let Ok(value) = HeaderValue::from_str(etag) {
            headers.insert(IF_NONE_MATCH, value);
        }
    }

    match client.head(url, headers).await {
        Ok(_) => true,
        Err(ArtiError::InvalidResponse { status: 304, .. }) => false,
        Err(err) => {
            warn!(url, code = err.code(), error = %err, "freshness check failed, assuming no update");
            false
        }
    }
}
