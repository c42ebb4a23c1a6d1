//! Structured filter engine
//!
//! Applies parsed clauses to a collection. Matching is case-insensitive
//! substring matching throughout; a snippet is kept iff it passes every clause.
//! Relative order is preserved.

use crate::interface::{FilterKind, ParsedSearch, SearchFilter};
use crate::models::Snippet;

/// Separator between tags inside one `tag:` clause
pub const TAG_VALUE_SEPARATOR: char = ',';

/// Keep the snippets that satisfy every clause of `parsed`.
/// With no clauses the whole collection is returned in order.
pub fn apply_filters<'a>(snippets: &'a [Snippet], parsed: &ParsedSearch) -> Vec<&'a Snippet> {
    if !parsed.has_filters() {
        return snippets.iter().collect();
    }
    let compiled: Vec<CompiledFilter> = parsed.filters.iter().map(CompiledFilter::new).collect();
    snippets
        .iter()
        .filter(|snippet| compiled.iter().all(|f| f.matches(snippet)))
        .collect()
}

/// Whether a single clause accepts a snippet.
pub fn filter_matches(filter: &SearchFilter, snippet: &Snippet) -> bool {
    CompiledFilter::new(filter).matches(snippet)
}

/// A clause with its value lowercased (and split, for tags) once up front.
enum CompiledFilter {
    /// Every needle must be a substring of at least one tag
    Tags(Vec<String>),
    Title(String),
    Body(String),
    TitleOrBody(String),
}

impl CompiledFilter {
    fn new(filter: &SearchFilter) -> Self {
        let value = filter.value.to_lowercase();
        match filter.kind {
            FilterKind::Tag => CompiledFilter::Tags(
                value
                    .split(TAG_VALUE_SEPARATOR)
                    .map(|t| t.trim().to_string())
                    .collect(),
            ),
            FilterKind::Title => CompiledFilter::Title(value),
            FilterKind::Body => CompiledFilter::Body(value),
            FilterKind::All => CompiledFilter::TitleOrBody(value),
        }
    }

    fn matches(&self, snippet: &Snippet) -> bool {
        match self {
            CompiledFilter::Tags(needles) => needles.iter().all(|n| snippet.tags.any_contains(n)),
            CompiledFilter::Title(v) => contains_ci(&snippet.title, v),
            CompiledFilter::Body(v) => contains_ci(&snippet.body, v),
            CompiledFilter::TitleOrBody(v) => {
                contains_ci(&snippet.title, v) || contains_ci(&snippet.body, v)
            }
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
