//! HTTP validator headers persisted alongside package metadata.

use serde::{Deserialize, Serialize};

/// Marker prefixed to the release identifier derived from an ETag
pub const RELEASE_PREFIX: &str = "e-tag:";

/// Cache/validator headers collected verbatim from a successful archive
/// response and stored in the host's package-metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHeaderSet {
    #[serde(rename = "Content-MD5", skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,

    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "Last-Modified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(rename = "Content-Language", skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    #[serde(rename = "Content-Length", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<String>,

    #[serde(rename = "Content-Type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(rename = "Content-Disposition", skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
}

impl CacheHeaderSet {
    /// Collect the header set through a name lookup, typically backed by
    /// an HTTP response's header map.
    pub fn collect<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self {
            content_md5: lookup("Content-MD5"),
            etag: lookup("ETag"),
            last_modified: lookup("Last-Modified"),
            content_language: lookup("Content-Language"),
            content_length: lookup("Content-Length"),
            content_type: lookup("Content-Type"),
            content_disposition: lookup("Content-Disposition"),
        }
    }

    /// Human-visible release identifier: the first 10 characters of the
    /// ETag (quotes stripped) behind the `e-tag:` marker.
    pub fn release_tag(&self) -> Option<String> {
        let etag = self.etag.as_deref()?;
        let clean = etag.trim_matches('"');
        let short: String = clean.chars().take(10).collect();
        Some(format!("{RELEASE_PREFIX}{short}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_picks_known_headers() {
        let headers = CacheHeaderSet::collect(|name| match name {
            "ETag" => Some("\"abc\"".to_string()),
            "Content-Type" => Some("application/x-gzip".to_string()),
            _ => None,
        });

        assert_eq!(headers.etag.as_deref(), Some("\"abc\""));
        assert_eq!(headers.content_type.as_deref(), Some("application/x-gzip"));
        assert_eq!(headers.content_md5, None);
    }

    #[test]
    fn test_release_tag_strips_quotes_and_truncates() {
        let headers = CacheHeaderSet {
            etag: Some("\"abc1234567890\"".to_string()),
            ..Default::default()
        };
        assert_eq!(headers.release_tag().as_deref(), Some("e-tag:abc1234567"));
    }

    #[test]
    fn test_release_tag_short_etag() {
        let headers = CacheHeaderSet {
            etag: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(headers.release_tag().as_deref(), Some("e-tag:abc"));
    }

    #[test]
    fn test_release_tag_absent_without_etag() {
        assert_eq!(CacheHeaderSet::default().release_tag(), None);
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let headers = CacheHeaderSet {
            etag: Some("\"abc\"".to_string()),
            content_length: Some("123".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json["ETag"], "\"abc\"");
        assert_eq!(json["Content-Length"], "123");
        assert!(json.get("Content-MD5").is_none());
    }
}
