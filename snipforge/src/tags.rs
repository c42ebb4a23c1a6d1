//! Tag normalization and the typed tag set
//!
//! A tag's canonical form is trimmed and lowercased; empty results are dropped.
//! `TagSet` is the only representation stored and compared. Its JSON encoding
//! (`to_json` / `from_json`) is the boundary to persistence and export: decoding
//! is lenient and turns anything malformed into an empty set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Snippet;

/// Canonical form of a single tag: trimmed, lowercased.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize every tag, drop empty results and duplicates.
/// First-seen order is kept so encoding is deterministic.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let normalized = normalize_tag(tag.as_ref());
        if !normalized.is_empty() && !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}

/// Normalized, deduplicated tag collection.
///
/// Equality is order-insensitive; iteration follows first insertion.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag in canonical form. Returns false if it was empty or present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let normalized = normalize_tag(tag);
        if normalized.is_empty() || self.0.contains(&normalized) {
            return false;
        }
        self.0.push(normalized);
        true
    }

    /// Exact membership after normalization
    pub fn contains(&self, tag: &str) -> bool {
        let normalized = normalize_tag(tag);
        self.0.iter().any(|t| *t == normalized)
    }

    /// Whether any tag contains `needle` (already lowercased) as a substring
    pub fn any_contains(&self, needle: &str) -> bool {
        self.0.iter().any(|t| t.contains(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Encode as a JSON array string (`["git","docker"]`).
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode a JSON array string. Non-arrays, non-string elements and
    /// malformed JSON all decode to an empty set.
    pub fn from_json(json: &str) -> Self {
        Self::try_from_json(json).unwrap_or_default()
    }

    /// Strict variant of [`TagSet::from_json`], for callers that want to log
    /// or count corrupt records.
    pub fn try_from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<String>>(json).map(Self::from)
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|t| other.0.contains(t))
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self(normalize_tags(tags))
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(normalize_tags(iter))
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// All distinct tags across a collection, sorted alphabetically.
pub fn tag_vocabulary<'a, I>(snippets: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Snippet>,
{
    let vocabulary: BTreeSet<&str> = snippets
        .into_iter()
        .flat_map(|s| s.tags.iter())
        .collect();
    vocabulary.into_iter().map(str::to_string).collect()
}

/// Snippets carrying every one of `tags` (exact membership after
/// normalization). An empty tag list keeps everything.
pub fn filter_by_tags<'a, S: AsRef<str>>(snippets: &'a [Snippet], tags: &[S]) -> Vec<&'a Snippet> {
    let wanted = normalize_tags(tags);
    snippets
        .iter()
        .filter(|s| wanted.iter().all(|t| s.tags.contains(t)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetFields;

    fn snippet(id: i64, tags: &[&str]) -> Snippet {
        Snippet::from_fields(id, SnippetFields::new("t", "b").with_tags(tags.iter().copied()))
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  GitHub  "), "github");
        assert_eq!(normalize_tag("Docker"), "docker");
        assert_eq!(normalize_tag("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["", "  A b ", "ÄÖÜ", "\tTab\n", "already"] {
            let once = normalize_tag(s);
            assert_eq!(normalize_tag(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_normalize_tags_dedupes_and_drops_empty() {
        assert_eq!(normalize_tags(["Git", " github ", "GIT", "  "]), vec!["git", "github"]);
    }

    #[test]
    fn test_tag_set_equality_ignores_order() {
        let a: TagSet = ["git", "docker"].into_iter().collect();
        let b: TagSet = ["Docker", "GIT", "git"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_tag_set_insert() {
        let mut tags = TagSet::new();
        assert!(tags.insert(" Rust "));
        assert!(!tags.insert("rust"));
        assert!(!tags.insert("  "));
        assert!(tags.contains("RUST"));
    }

    #[test]
    fn test_from_json_normalizes() {
        let tags = TagSet::from_json(r#"["Git", "Docker", "git"]"#);
        assert_eq!(tags.as_slice(), ["git", "docker"]);
    }

    #[test]
    fn test_from_json_malformed_is_empty() {
        assert!(TagSet::from_json("not json").is_empty());
        assert!(TagSet::from_json(r#"{"a": 1}"#).is_empty());
        assert!(TagSet::from_json(r#"[1, 2]"#).is_empty());
        assert!(TagSet::from_json("").is_empty());
        assert!(TagSet::try_from_json("[").is_err());
    }

    #[test]
    fn test_json_round_trip_is_normalized_form() {
        let raw = vec!["  Shell ".to_string(), "SSH".to_string(), "shell".to_string()];
        let encoded = TagSet::from(raw).to_json();
        assert_eq!(encoded, r#"["shell","ssh"]"#);
        assert_eq!(TagSet::from_json(&encoded).to_json(), encoded);
    }

    #[test]
    fn test_serde_array_normalizes() {
        let tags: TagSet = serde_json::from_str(r#"[" A ", "a", "B"]"#).unwrap();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_tag_vocabulary_sorted_distinct() {
        let snippets = vec![snippet(1, &["ssh", "remote"]), snippet(2, &["git", "ssh"])];
        assert_eq!(tag_vocabulary(&snippets), vec!["git", "remote", "ssh"]);
    }

    #[test]
    fn test_filter_by_tags_exact_and() {
        let snippets = vec![
            snippet(1, &["git", "github"]),
            snippet(2, &["github"]),
            snippet(3, &["git"]),
        ];
        let ids: Vec<i64> = filter_by_tags(&snippets, &["GIT", "github"])
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![1]);

        let empty: [&str; 0] = [];
        assert_eq!(filter_by_tags(&snippets, &empty).len(), 3);
    }
}
