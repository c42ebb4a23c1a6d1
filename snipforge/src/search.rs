//! Search Engine (ranking session + query pipeline)
//!
//! A `RankingSession` owns a snapshot of the collection and lazily builds the
//! match index (one `SnippetCandidate` per snippet) on the first ranked query.
//! Later queries against the same session reuse that index. A collection
//! change means building a new session; nothing here invalidates implicitly.
//!
//! `RankingSession::search` is the full pipeline: parse the query, return the
//! snapshot untouched when there is nothing to match, rank a lone free-text
//! clause fuzzily, and run every other query through the structured filter.

use std::sync::{Arc, OnceLock};

use crate::candidate::SnippetCandidate;
use crate::filter::apply_filters;
use crate::models::Snippet;
use crate::query::parse_search_query;
use crate::ranking::{weighted_score, PreparedQuery, RankerConfig};

/// Ranking handle over one snapshot of the snippet collection
#[derive(Debug)]
pub struct RankingSession {
    snippets: Arc<[Snippet]>,
    config: RankerConfig,
    index: OnceLock<Vec<SnippetCandidate>>,
}

impl RankingSession {
    pub fn new(snippets: impl Into<Arc<[Snippet]>>) -> Self {
        Self::with_config(snippets, RankerConfig::default())
    }

    pub fn with_config(snippets: impl Into<Arc<[Snippet]>>, config: RankerConfig) -> Self {
        Self {
            snippets: snippets.into(),
            config,
            index: OnceLock::new(),
        }
    }

    /// The snapshot this session ranks, in stored order
    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Whether the match index has been built yet
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    fn index(&self) -> &[SnippetCandidate] {
        self.index.get_or_init(|| {
            tracing::debug!(snippets = self.snippets.len(), "building ranking index");
            build_index(&self.snippets)
        })
    }

    /// Fuzzy-rank the snapshot, best match first. Blank queries return the
    /// snapshot unchanged.
    pub fn rank(&self, query: &str) -> Vec<&Snippet> {
        if query.trim().is_empty() {
            return self.snippets.iter().collect();
        }
        #[cfg(feature = "perf-log")]
        let started = std::time::Instant::now();

        let prepared = PreparedQuery::new(query, &self.config);
        let order = rank_candidates(self.index(), &prepared, &self.config);

        #[cfg(feature = "perf-log")]
        tracing::debug!(
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            candidates = self.snippets.len(),
            matched = order.len(),
            "ranked query"
        );

        order.into_iter().map(|i| &self.snippets[i]).collect()
    }

    /// Run a raw query through the parser, then the fuzzy ranker or the
    /// structured filter.
    pub fn search(&self, query: &str) -> Vec<&Snippet> {
        let parsed = parse_search_query(query);
        if !parsed.has_filters() {
            return self.snippets.iter().collect();
        }
        if let Some(text) = parsed.single_free_text() {
            return self.rank(text);
        }
        apply_filters(&self.snippets, &parsed)
    }

    /// All distinct tags in the snapshot, sorted
    pub fn tag_vocabulary(&self) -> Vec<String> {
        crate::tags::tag_vocabulary(self.snippets.iter())
    }
}

/// One-shot fuzzy ranking without keeping an index around.
pub fn rank_snippets<'a>(
    snippets: &'a [Snippet],
    query: &str,
    config: &RankerConfig,
) -> Vec<&'a Snippet> {
    if query.trim().is_empty() {
        return snippets.iter().collect();
    }
    let prepared = PreparedQuery::new(query, config);
    rank_candidates(&build_index(snippets), &prepared, config)
        .into_iter()
        .map(|i| &snippets[i])
        .collect()
}

fn build_index(snippets: &[Snippet]) -> Vec<SnippetCandidate> {
    snippets
        .iter()
        .enumerate()
        .map(|(position, snippet)| SnippetCandidate::new(position, snippet))
        .collect()
}

/// Positions of matching candidates, best first. Ties keep input order.
fn rank_candidates(
    candidates: &[SnippetCandidate],
    query: &PreparedQuery,
    config: &RankerConfig,
) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f64)> = candidates
        .iter()
        .filter_map(|c| {
            weighted_score(&c.similarities(query), config).map(|score| (c.position, score))
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(position, _)| position).collect()
}

/// Split text into tokens: runs of alphanumeric chars (words) and runs of
/// other non-whitespace chars (punctuation). Whitespace only separates.
pub(crate) fn tokenize_words(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();
    while let Some(&first) = chars.peek() {
        if first.is_whitespace() {
            chars.next();
            continue;
        }
        let is_word = first.is_alphanumeric();
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c.is_alphanumeric() != is_word {
                break;
            }
            token.push(c);
            chars.next();
        }
        tokens.push(token);
    }
    tokens
}

/// Whether a token from `tokenize_words` is an alphanumeric word (vs punctuation).
/// Tokens are homogeneous runs, so checking the first character is sufficient.
pub(crate) fn is_word_token(token: &str) -> bool {
    token.starts_with(|c: char| c.is_alphanumeric())
}
