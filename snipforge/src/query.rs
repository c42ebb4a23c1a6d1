//! Search query parser
//!
//! Grammar: segments separated by `|`, each either `tag:VALUE`, `title:VALUE`,
//! `body:VALUE` (prefixes are case-sensitive) or free text. Parsing is total:
//! every input yields a `ParsedSearch`, possibly empty.

use crate::interface::{FilterKind, ParsedSearch, SearchFilter};

/// Separator between clauses
pub const CLAUSE_SEPARATOR: char = '|';

const PREFIXED_KINDS: [FilterKind; 3] = [FilterKind::Tag, FilterKind::Title, FilterKind::Body];

/// Parse a raw query into ordered filter clauses.
pub fn parse_search_query(query: &str) -> ParsedSearch {
    if query.trim().is_empty() {
        return ParsedSearch::default();
    }

    let filters = query
        .split(CLAUSE_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(parse_segment)
        .collect();

    ParsedSearch { filters }
}

/// One trimmed, non-empty segment. A known prefix with an empty value yields
/// nothing.
fn parse_segment(segment: &str) -> Option<SearchFilter> {
    match split_prefix(segment) {
        Some((kind, value)) => {
            let value = value.trim();
            (!value.is_empty()).then(|| SearchFilter::new(kind, value))
        }
        None => Some(SearchFilter::new(FilterKind::All, segment)),
    }
}

/// Match a leading `tag:` / `title:` / `body:` and return the remainder.
fn split_prefix(segment: &str) -> Option<(FilterKind, &str)> {
    PREFIXED_KINDS.iter().find_map(|&kind| {
        let prefix = kind.prefix()?;
        segment
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|value| (kind, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(query: &str) -> Vec<(FilterKind, String)> {
        parse_search_query(query)
            .filters
            .into_iter()
            .map(|f| (f.kind, f.value))
            .collect()
    }

    #[test]
    fn test_empty_query_has_no_filters() {
        assert!(!parse_search_query("").has_filters());
        assert!(!parse_search_query("   \t ").has_filters());
    }

    #[test]
    fn test_free_text_is_all_filter() {
        assert_eq!(filters("  docker ps "), vec![(FilterKind::All, "docker ps".to_string())]);
    }

    #[test]
    fn test_prefixed_filters() {
        assert_eq!(
            filters("tag:git|title: ssh |body:docker"),
            vec![
                (FilterKind::Tag, "git".to_string()),
                (FilterKind::Title, "ssh".to_string()),
                (FilterKind::Body, "docker".to_string()),
            ]
        );
    }

    #[test]
    fn test_tag_value_keeps_commas() {
        assert_eq!(filters("tag:git, docker"), vec![(FilterKind::Tag, "git, docker".to_string())]);
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(filters("Tag:git"), vec![(FilterKind::All, "Tag:git".to_string())]);
    }

    #[test]
    fn test_prefix_needs_colon_directly_after() {
        assert_eq!(filters("tag :git"), vec![(FilterKind::All, "tag :git".to_string())]);
        assert_eq!(filters("tags:git"), vec![(FilterKind::All, "tags:git".to_string())]);
    }

    #[test]
    fn test_empty_prefixed_value_is_dropped() {
        assert!(filters("tag:|title:  ").is_empty());
        assert!(!parse_search_query("tag:").has_filters());
    }

    #[test]
    fn test_only_pipes() {
        assert!(!parse_search_query("|||").has_filters());
        assert_eq!(filters("| a ||b|"), vec![
            (FilterKind::All, "a".to_string()),
            (FilterKind::All, "b".to_string()),
        ]);
    }

    #[test]
    fn test_value_may_contain_colons() {
        assert_eq!(filters("body:http://x"), vec![(FilterKind::Body, "http://x".to_string())]);
    }

    #[test]
    fn test_parser_is_total_on_odd_input() {
        for q in ["{{", "tag:{{", "::", "tag:tag:", "|tag:|", "\u{0}", "título:x", "🦀|🦀"] {
            let parsed = parse_search_query(q);
            assert!(parsed.filters.iter().all(|f| !f.value.is_empty()), "{:?}", q);
        }
    }

    #[test]
    fn test_single_free_text() {
        assert_eq!(parse_search_query("ssh").single_free_text(), Some("ssh"));
        assert_eq!(parse_search_query("ssh|git").single_free_text(), None);
        assert_eq!(parse_search_query("tag:git").single_free_text(), None);
    }
}
