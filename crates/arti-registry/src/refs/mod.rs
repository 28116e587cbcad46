//! Git ref advertisement parsing.
//!
//! The registry's metadata endpoint speaks the Git smart-HTTP
//! advertisement format: one ref per line, `<object-id> refs/...`.
//! This module derives tag, branch and version listings from that text;
//! it does not implement any further part of the Git protocol.

use std::collections::BTreeMap;

use semver::Version;

/// Suffix marking a peeled tag line (the commit a tag object points to)
pub const PEELED_MARKER: &str = "^{}";

const TAG_REF_PREFIX: &str = "refs/tags/";
const HEAD_REF_PREFIX: &str = "refs/heads/";

/// One parsed advertisement line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// Full ref name, e.g. `refs/tags/v1.2.0`
    pub name: String,
    /// Object id the ref points at
    pub commit: String,
}

/// A tag that parses as a semantic version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Normalized version parsed from the tag name
    pub version: Version,
    /// Tag name as advertised
    pub tag: String,
    /// Object id the tag points at
    pub commit: String,
}

/// Split an advertisement body into trimmed, non-empty lines.
pub fn advertisement_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one advertisement line into a ref entry.
///
/// Accepts 40- or 64-hex object ids, with or without the 4-hex pkt-line
/// length prefix the smart-HTTP transport prepends to the first id of a
/// packet; the prefix is dropped from the stored commit. Lines that do
/// not fit the `<id> refs/...` shape (service announcements, pkt-line
/// terminators, capability suffixes) yield `None`.
pub fn parse_ref_line(line: &str) -> Option<RefEntry> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?;
    let name = parts.next()?;

    let commit = parse_object_id(id)?;
    if !name.starts_with("refs/") {
        return None;
    }

    Some(RefEntry {
        name: name.to_string(),
        commit,
    })
}

fn parse_object_id(token: &str) -> Option<String> {
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match token.len() {
        // SHA-1 and SHA-256 ids
        40 | 64 => Some(token.to_string()),
        // Same, behind a 4-hex pkt-line length prefix
        44 | 68 => Some(token[4..].to_string()),
        _ => None,
    }
}

/// Derive the tag map from advertisement lines.
///
/// A line counts as a tag when its ref name sits under `refs/tags/` and
/// does not end with the peeled marker. Duplicate names overwrite, so
/// the last advertisement wins.
pub fn tags_from_lines(lines: &[String]) -> BTreeMap<String, String> {
    refs_under(lines, TAG_REF_PREFIX)
}

/// Derive the branch map from advertisement lines (`refs/heads/`).
pub fn branches_from_lines(lines: &[String]) -> BTreeMap<String, String> {
    refs_under(lines, HEAD_REF_PREFIX)
}

fn refs_under(lines: &[String], prefix: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for entry in lines.iter().filter_map(|line| parse_ref_line(line)) {
        let Some(name) = entry.name.strip_prefix(prefix) else {
            continue;
        };
        if name.is_empty() || name.ends_with(PEELED_MARKER) {
            continue;
        }
        map.insert(name.to_string(), entry.commit);
    }
    map
}

/// Normalize a tag name to a semantic version.
///
/// A leading `v`/`V` is stripped; anything that the semver grammar does
/// not accept is discarded.
pub fn normalize_version(tag: &str) -> Option<Version> {
    let clean = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
    Version::parse(clean).ok()
}

/// Derive the version list from a tag map: only tags that normalize to
/// a semantic version survive, sorted descending by version with ties
/// broken by ascending tag name.
pub fn versions_from_tags(tags: &BTreeMap<String, String>) -> Vec<VersionEntry> {
    let mut versions: Vec<VersionEntry> = tags
        .iter()
        .filter_map(|(tag, commit)| {
            normalize_version(tag).map(|version| VersionEntry {
                version,
                tag: tag.clone(),
                commit: commit.clone(),
            })
        })
        .collect();

    versions.sort_by(|a, b| b.version.cmp(&a.version).then_with(|| a.tag.cmp(&b.tag)));
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const COMMIT_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_advertisement_lines_trims_and_drops_blanks() {
        let body = format!("  {COMMIT_A} refs/tags/v1.0.0  \n\n{COMMIT_B} refs/heads/main\n");
        assert_eq!(
            advertisement_lines(&body),
            lines(&[
                &format!("{COMMIT_A} refs/tags/v1.0.0"),
                &format!("{COMMIT_B} refs/heads/main"),
            ])
        );
    }

    #[test]
    fn test_parse_ref_line() {
        let entry = parse_ref_line(&format!("{COMMIT_A} refs/tags/v1.0.0")).unwrap();
        assert_eq!(entry.name, "refs/tags/v1.0.0");
        assert_eq!(entry.commit, COMMIT_A);
    }

    #[test]
    fn test_parse_ref_line_drops_pkt_line_prefix() {
        let entry = parse_ref_line(&format!("001e{COMMIT_A} refs/tags/v1.0.0")).unwrap();
        assert_eq!(entry.commit, COMMIT_A);
    }

    #[test]
    fn test_parse_ref_line_rejects_noise() {
        for line in [
            "# service=git-upload-pack",
            "0000",
            &format!("{COMMIT_A} HEAD"),
            "zzzz refs/tags/v1.0.0",
            "",
        ] {
            assert_eq!(parse_ref_line(line), None, "line {line:?}");
        }
    }

    #[test]
    fn test_tags_exclude_peeled_entries() {
        let advertisement = lines(&[
            &format!("{COMMIT_A} refs/tags/v1.0.0"),
            &format!("{COMMIT_B} refs/tags/v1.0.0^{{}}"),
            &format!("{COMMIT_B} refs/heads/main"),
        ]);

        let tags = tags_from_lines(&advertisement);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["v1.0.0"], COMMIT_A);
    }

    #[test]
    fn test_tags_last_duplicate_wins() {
        let advertisement = lines(&[
            &format!("{COMMIT_A} refs/tags/v1.0.0"),
            &format!("{COMMIT_B} refs/tags/v1.0.0"),
        ]);

        let tags = tags_from_lines(&advertisement);
        assert_eq!(tags["v1.0.0"], COMMIT_B);
    }

    #[test]
    fn test_branches_derive_from_heads_only() {
        let advertisement = lines(&[
            &format!("{COMMIT_A} refs/tags/v1.0.0"),
            &format!("{COMMIT_B} refs/heads/main"),
            &format!("{COMMIT_A} refs/heads/develop"),
        ]);

        let branches = branches_from_lines(&advertisement);
        assert_eq!(branches.len(), 2);
        assert_eq!(branches["main"], COMMIT_B);
        assert_eq!(branches["develop"], COMMIT_A);
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("v1.2.0"), Some(Version::new(1, 2, 0)));
        assert_eq!(normalize_version("V2.0.1"), Some(Version::new(2, 0, 1)));
        assert_eq!(normalize_version("1.0.0"), Some(Version::new(1, 0, 0)));
        assert_eq!(normalize_version("release-candidate"), None);
        assert_eq!(normalize_version("1.2"), None);
    }

    #[test]
    fn test_versions_sorted_descending() {
        let mut tags = BTreeMap::new();
        tags.insert("v1.1.0".to_string(), COMMIT_A.to_string());
        tags.insert("v1.10.0".to_string(), COMMIT_B.to_string());
        tags.insert("v1.2.0".to_string(), COMMIT_A.to_string());
        tags.insert("nightly".to_string(), COMMIT_B.to_string());

        let versions = versions_from_tags(&tags);
        let ordered: Vec<&str> = versions.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(ordered, vec!["v1.10.0", "v1.2.0", "v1.1.0"]);
    }

    #[test]
    fn test_versions_tie_break_is_lexical_tag_order() {
        let mut tags = BTreeMap::new();
        tags.insert("v1.2.0".to_string(), COMMIT_A.to_string());
        tags.insert("1.2.0".to_string(), COMMIT_B.to_string());

        let versions = versions_from_tags(&tags);
        let ordered: Vec<&str> = versions.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(ordered, vec!["1.2.0", "v1.2.0"]);
    }

    #[test]
    fn test_versions_empty_without_semver_tags() {
        let mut tags = BTreeMap::new();
        tags.insert("latest".to_string(), COMMIT_A.to_string());
        tags.insert("stable".to_string(), COMMIT_B.to_string());

        assert!(versions_from_tags(&tags).is_empty());
    }
}
