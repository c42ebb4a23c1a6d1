//! Ranking candidate with precomputed match fields.
//!
//! Module isolation ensures nothing outside this module can change the
//! lowercased fields after construction, so they always describe the snippet
//! they were built from.

use crate::ranking::{field_similarity, FieldSimilarities, PreparedQuery};
use crate::search::tokenize_words;
use crate::models::Snippet;

/// One lowercased, tokenized field
#[derive(Debug, Clone)]
struct IndexedField {
    lower: String,
    words: Vec<String>,
}

impl IndexedField {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words = tokenize_words(&lower);
        Self { lower, words }
    }

    fn similarity(&self, query: &PreparedQuery) -> f64 {
        field_similarity(&self.lower, &self.words, query)
    }
}

/// Match index entry for one snippet of a ranking session.
/// `position` is the snippet's index in the session snapshot.
#[derive(Debug, Clone)]
pub(crate) struct SnippetCandidate {
    pub position: usize,
    title: IndexedField,
    /// Each tag is matched as its own field; the best tag wins
    tags: Vec<IndexedField>,
    description: IndexedField,
    body: IndexedField,
}

impl SnippetCandidate {
    pub fn new(position: usize, snippet: &Snippet) -> Self {
        Self {
            position,
            title: IndexedField::new(&snippet.title),
            tags: snippet.tags.iter().map(IndexedField::new).collect(),
            description: IndexedField::new(&snippet.description),
            body: IndexedField::new(&snippet.body),
        }
    }

    pub fn similarities(&self, query: &PreparedQuery) -> FieldSimilarities {
        FieldSimilarities {
            title: self.title.similarity(query),
            tags: self.tags.iter().map(|t| t.similarity(query)).fold(0.0, f64::max),
            description: self.description.similarity(query),
            body: self.body.similarity(query),
        }
    }
}
