//! Package reference parsing.
//!
//! A source string of the form `arti://org/repo[/target]` identifies a
//! package in an artifactory-backed registry. The scheme check is an
//! explicit predicate so the host can dispatch sources to this resolver
//! without attempting a full parse.

use std::fmt;

use crate::error::{ArtiError, ArtiResult};

/// Scheme prefix recognized by this resolver
pub const SCHEME_PREFIX: &str = "arti://";

/// Target used when the source names no tag/branch/version
pub const DEFAULT_TARGET: &str = "*";

/// A parsed package reference. `org` and `repo` are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    org: String,
    repo: String,
    target: String,
}

impl PackageReference {
    /// Whether `source` carries the `arti://` scheme (case-insensitive).
    pub fn matches_scheme(source: &str) -> bool {
        source
            .get(..SCHEME_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME_PREFIX))
    }

    /// Parse a source string into an org/repo pair plus optional target.
    ///
    /// The scheme prefix is stripped when present; anything after the
    /// first two `/`-separated segments becomes the target.
    pub fn parse(source: &str) -> ArtiResult<Self> {
        let stripped = if Self::matches_scheme(source) {
            &source[SCHEME_PREFIX.len()..]
        } else {
            source
        };

        let mut segments = stripped.split('/');
        let org = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        if org.is_empty() || repo.is_empty() {
            return Err(ArtiError::InvalidSource {
                reference: source.to_string(),
                details: Some(format!(
                    "'{stripped}' does not contain an org/repo pair"
                )),
            });
        }

        let rest: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
        let target = if rest.is_empty() {
            DEFAULT_TARGET.to_string()
        } else {
            rest.join("/")
        };

        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
            target,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Replace the target, e.g. once the host has picked a concrete tag.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME_PREFIX}{}/{}", self.org, self.repo)?;
        if self.target != DEFAULT_TARGET {
            write!(f, "/{}", self.target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_scheme() {
        assert!(PackageReference::matches_scheme("arti://acme/widgets"));
        assert!(PackageReference::matches_scheme("ARTI://acme/widgets"));
        assert!(!PackageReference::matches_scheme("git://acme/widgets"));
        assert!(!PackageReference::matches_scheme("acme/widgets"));
        assert!(!PackageReference::matches_scheme(""));
    }

    #[test]
    fn test_parse_org_repo() {
        let reference = PackageReference::parse("arti://acme/widgets").unwrap();
        assert_eq!(reference.org(), "acme");
        assert_eq!(reference.repo(), "widgets");
        assert_eq!(reference.target(), DEFAULT_TARGET);
    }

    #[test]
    fn test_parse_with_target() {
        let reference = PackageReference::parse("arti://acme/widgets/1.2.0").unwrap();
        assert_eq!(reference.target(), "1.2.0");

        // Multi-segment targets survive as a whole
        let reference = PackageReference::parse("arti://acme/widgets/feature/login").unwrap();
        assert_eq!(reference.target(), "feature/login");
    }

    #[test]
    fn test_parse_without_scheme() {
        let reference = PackageReference::parse("acme/widgets").unwrap();
        assert_eq!(reference.org(), "acme");
        assert_eq!(reference.repo(), "widgets");
    }

    #[test]
    fn test_parse_rejects_short_sources() {
        for source in ["arti://acme", "arti://", "arti:///widgets", ""] {
            let err = PackageReference::parse(source).unwrap_err();
            assert_eq!(err.code(), "EINVEND", "source {source:?}");
        }
    }

    #[test]
    fn test_with_target() {
        let reference = PackageReference::parse("arti://acme/widgets")
            .unwrap()
            .with_target("2.0.0");
        assert_eq!(reference.target(), "2.0.0");
    }

    #[test]
    fn test_display() {
        let reference = PackageReference::parse("arti://acme/widgets/1.2.0").unwrap();
        assert_eq!(reference.to_string(), "arti://acme/widgets/1.2.0");

        let reference = PackageReference::parse("arti://acme/widgets").unwrap();
        assert_eq!(reference.to_string(), "arti://acme/widgets");
    }
}
