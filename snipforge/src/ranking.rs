//! Weighted multi-field similarity scoring.
//!
//! Each query word is matched against the words of a field with the same
//! ladder used everywhere in search: exact -> prefix -> infix -> fuzzy (bounded
//! Damerau-Levenshtein) -> subsequence (abbreviation). A field's similarity is
//! 1.0 when it contains the whole query, otherwise the mean of the per-word
//! best matches. A field counts only if its similarity clears the configured
//! threshold; a snippet's score is the weighted sum of the fields that count.

use serde::{Deserialize, Serialize};

/// Field weights and match tolerances for the fuzzy ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankerConfig {
    pub title_weight: f64,
    pub tags_weight: f64,
    pub description_weight: f64,
    pub body_weight: f64,
    /// Maximum accepted distance (0 = exact only, 1 = anything).
    /// A field matches when its similarity is at least `1 - threshold`.
    pub threshold: f64,
    /// Query words shorter than this (in chars) are ignored
    pub min_match_chars: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            title_weight: 2.0,
            tags_weight: 1.5,
            description_weight: 1.0,
            body_weight: 0.5,
            threshold: 0.4,
            min_match_chars: 2,
        }
    }
}

impl RankerConfig {
    fn min_similarity(&self) -> f64 {
        1.0 - self.threshold.clamp(0.0, 1.0)
    }
}

/// Similarity credited for each kind of word match
const EXACT_SCORE: f64 = 1.0;
const PREFIX_SCORE: f64 = 0.9;
const INFIX_SCORE: f64 = 0.8;
const FUZZY_BASE_SCORE: f64 = 0.75;
const FUZZY_STEP: f64 = 0.15;
const SUBSEQUENCE_BASE_SCORE: f64 = 0.7;
const SUBSEQUENCE_STEP: f64 = 0.05;
const SUBSEQUENCE_FLOOR: f64 = 0.5;

/// A lowercased query split into the words that take part in matching
#[derive(Debug, Clone)]
pub(crate) struct PreparedQuery {
    pub(crate) lower: String,
    pub(crate) words: Vec<String>,
    min_chars: usize,
}

impl PreparedQuery {
    pub(crate) fn new(query: &str, config: &RankerConfig) -> Self {
        let lower = query.trim().to_lowercase();
        let words = crate::search::tokenize_words(&lower)
            .into_iter()
            .filter(|w| {
                crate::search::is_word_token(w) && w.chars().count() >= config.min_match_chars
            })
            .collect();
        Self {
            lower,
            words,
            min_chars: config.min_match_chars.max(1),
        }
    }

    /// Nothing long enough to match
    pub(crate) fn is_empty(&self) -> bool {
        self.words.is_empty() && self.lower.chars().count() < self.min_chars
    }
}

/// Similarity of a field (already lowercased and tokenized) to the query, 0.0..=1.0
pub(crate) fn field_similarity(
    field_lower: &str,
    field_words: &[String],
    query: &PreparedQuery,
) -> f64 {
    if field_lower.is_empty() {
        return 0.0;
    }
    if query.lower.chars().count() >= query.min_chars && field_lower.contains(&query.lower) {
        return EXACT_SCORE;
    }
    if query.words.is_empty() {
        return 0.0;
    }

    let total: f64 = query
        .words
        .iter()
        .map(|qw| {
            field_words
                .iter()
                .map(|dw| word_similarity(does_word_match(qw, dw, query.min_chars)))
                .fold(0.0, f64::max)
        })
        .sum();
    total / query.words.len() as f64
}

/// Weighted score of one snippet; `None` when no field clears the threshold.
pub(crate) fn weighted_score(
    similarities: &FieldSimilarities,
    config: &RankerConfig,
) -> Option<f64> {
    let min = config.min_similarity();
    let weighted = [
        (similarities.title, config.title_weight),
        (similarities.tags, config.tags_weight),
        (similarities.description, config.description_weight),
        (similarities.body, config.body_weight),
    ];
    let mut matched = false;
    let mut score = 0.0;
    for (similarity, weight) in weighted {
        if similarity > 0.0 && similarity >= min {
            matched = true;
            score += similarity * weight;
        }
    }
    matched.then_some(score)
}

/// Per-field similarities of one snippet
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct FieldSimilarities {
    pub(crate) title: f64,
    pub(crate) tags: f64,
    pub(crate) description: f64,
    pub(crate) body: f64,
}

fn word_similarity(kind: WordMatchKind) -> f64 {
    match kind {
        WordMatchKind::None => 0.0,
        WordMatchKind::Exact => EXACT_SCORE,
        WordMatchKind::Prefix => PREFIX_SCORE,
        WordMatchKind::Infix => INFIX_SCORE,
        WordMatchKind::Fuzzy(dist) => {
            FUZZY_BASE_SCORE - FUZZY_STEP * f64::from(dist.saturating_sub(1))
        }
        WordMatchKind::Subsequence(gaps) => {
            (SUBSEQUENCE_BASE_SCORE - SUBSEQUENCE_STEP * f64::from(gaps)).max(SUBSEQUENCE_FLOOR)
        }
    }
}

/// Result of matching a query word against a document word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WordMatchKind {
    None,
    Exact,
    Prefix,
    Infix,
    Fuzzy(u8),
    Subsequence(u8),
}

/// Match a query word against a document word: exact -> prefix -> infix (both
/// need at least `min_chars` chars) -> fuzzy (edit distance) -> subsequence
/// (abbreviation). Both inputs must already be lowercased.
pub(crate) fn does_word_match(qw_lower: &str, dw_lower: &str, min_chars: usize) -> WordMatchKind {
    if dw_lower == qw_lower {
        return WordMatchKind::Exact;
    }
    let q_len = qw_lower.chars().count();
    if q_len >= min_chars {
        if dw_lower.starts_with(qw_lower) {
            return WordMatchKind::Prefix;
        }
        if dw_lower.contains(qw_lower) {
            return WordMatchKind::Infix;
        }
    }
    let max_typo = max_edit_distance(q_len);
    if max_typo > 0 {
        if let Some(dist) = edit_distance_bounded(qw_lower, dw_lower, max_typo) {
            if dist > 0 {
                return WordMatchKind::Fuzzy(dist);
            }
        }
    }
    if let Some(gaps) = subsequence_match(qw_lower, dw_lower) {
        return WordMatchKind::Subsequence(gaps);
    }
    WordMatchKind::None
}

/// Check if all characters in `query` appear in order in `target`.
/// Returns the number of gaps (non-contiguous segments - 1) if matched, None otherwise.
fn subsequence_match(query: &str, target: &str) -> Option<u8> {
    let q_chars: Vec<char> = query.chars().collect();
    let t_chars: Vec<char> = target.chars().collect();

    // Min 3 chars to avoid spurious matches
    if q_chars.len() < 3 {
        return None;
    }
    if q_chars.len() >= t_chars.len() {
        return None;
    }
    // Query must cover at least 50% of target length
    if q_chars.len() * 2 < t_chars.len() {
        return None;
    }
    // Abbreviations keep the initial letter
    if q_chars[0] != t_chars[0] {
        return None;
    }

    let mut qi = 0;
    let mut gaps = 0u8;
    let mut prev_matched = false;

    for &tc in &t_chars {
        if qi < q_chars.len() && tc == q_chars[qi] {
            if !prev_matched && qi > 0 {
                gaps = gaps.saturating_add(1);
            }
            qi += 1;
            prev_matched = true;
        } else {
            prev_matched = false;
        }
    }

    (qi == q_chars.len()).then_some(gaps)
}

/// Maximum allowed edit distance based on word length. Three-letter words
/// already get one edit so `shh` still finds `ssh`.
pub(crate) fn max_edit_distance(word_len: usize) -> u8 {
    if word_len < 3 {
        0
    } else if word_len <= 8 {
        1
    } else {
        2
    }
}

/// Damerau-Levenshtein edit distance (optimal string alignment) with threshold pruning.
/// Counts insertions, deletions, substitutions, and adjacent transpositions each as 1 edit.
/// Returns `Some(distance)` if distance <= max_dist, `None` otherwise.
pub fn edit_distance_bounded(a: &str, b: &str, max_dist: u8) -> Option<u8> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();
    let max_d = max_dist as usize;

    if m.abs_diff(n) > max_d {
        return None;
    }

    let mut prev2 = vec![0usize; n + 1];
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);

            if i >= 2
                && j >= 2
                && a_chars[i - 1] == b_chars[j - 2]
                && a_chars[i - 2] == b_chars[j - 1]
            {
                curr[j] = curr[j].min(prev2[j - 2] + 1);
            }

            row_min = row_min.min(curr[j]);
        }

        if row_min > max_d {
            return None;
        }

        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    let result = prev[n];
    (result <= max_d).then_some(result as u8)
}
