//! Package metadata record persisted by the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use arti_core::CacheHeaderSet;

/// The host's package-metadata record, enriched by the resolver with
/// validator headers and the derived release identifier. Everything
/// else the host put in the record passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMeta {
    /// Package name, when the host recorded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Validator headers captured from the archive response
    #[serde(rename = "_cacheHeaders", skip_serializing_if = "Option::is_none")]
    pub cache_headers: Option<CacheHeaderSet>,

    /// Human-visible release identifier derived from the ETag
    #[serde(rename = "_release", skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Host-owned fields, passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
