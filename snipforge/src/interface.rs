//! SnipForge public interface
//!
//! Shared records, options and the error type used across the crate, plus the
//! persistence contract the core consumes. Everything a caller (CLI, desktop
//! shell) needs to talk to the search & tagging core is defined here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Snippet, SnippetFields};
use crate::transfer::ImportError;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Kind of a parsed filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Tag,
    Title,
    Body,
    /// Free text, matched against title or body
    All,
}

impl FilterKind {
    /// Query prefix for this kind (`tag`, `title`, `body`). `All` has none.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            FilterKind::Tag => Some("tag"),
            FilterKind::Title => Some("title"),
            FilterKind::Body => Some("body"),
            FilterKind::All => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// One typed constraint derived from a query segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub kind: FilterKind,
    pub value: String,
}

impl SearchFilter {
    pub fn new(kind: FilterKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Result of parsing a raw query: clauses combined with AND.
/// An empty list means "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedSearch {
    pub filters: Vec<SearchFilter>,
}

impl ParsedSearch {
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// The free-text value when the query is a single unprefixed clause.
    pub fn single_free_text(&self) -> Option<&str> {
        match self.filters.as_slice() {
            [only] if only.kind == FilterKind::All => Some(only.value.as_str()),
            _ => None,
        }
    }
}

/// Options for multi-tag completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutocompleteOptions {
    /// Separator between tags
    pub separator: String,
    /// How many suggestions to consider (only the best one is applied)
    pub max_suggestions: usize,
    /// Append "<separator> " after a completion so typing can continue
    pub add_separator_after_completion: bool,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            max_suggestions: 1,
            add_separator_after_completion: true,
        }
    }
}

/// Outcome of completing the last tag of a separator-joined tag list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCompletion {
    pub completed: String,
    pub was_completed: bool,
    pub suggestion: Option<String>,
    pub original_last_tag: String,
}

/// Ghost-text suggestion for the tag under the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSuggestion {
    pub suggestion: Option<String>,
    /// The part of `suggestion` not yet typed
    pub completion_text: Option<String>,
    pub before_cursor: String,
    pub after_cursor: String,
    pub current_tag: String,
    pub is_at_end_of_tag: bool,
}

/// Outcome of completing a `tag:` clause inside a structured query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QueryCompletion {
    pub completed: Option<String>,
    pub was_completed: bool,
    pub suggestion: Option<String>,
}

/// Error type for SnipForge operations
#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Snippet not found: {0}")]
    NotFound(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::database::DatabaseError> for SnippetError {
    fn from(e: crate::database::DatabaseError) -> Self {
        SnippetError::Database(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENCE CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// CRUD contract of the persistence collaborator.
///
/// The core only reads snippets through `list_all`; the write operations exist
/// so the store facade can invalidate its ranking session when it forwards a
/// mutation.
pub trait SnippetRepository: Send + Sync {
    /// All snippets, most recently updated first
    fn list_all(&self) -> Result<Vec<Snippet>, SnippetError>;

    /// Insert a snippet. Returns the new id.
    fn create(&self, fields: &SnippetFields) -> Result<i64, SnippetError>;

    /// Replace the fields of an existing snippet. Returns false for unknown ids.
    fn update(&self, id: i64, fields: &SnippetFields) -> Result<bool, SnippetError>;

    /// Delete by id. Returns false for unknown ids.
    fn delete(&self, id: i64) -> Result<bool, SnippetError>;

    /// Insert several snippets. Implementations backed by a transactional
    /// store should make this all-or-nothing.
    fn create_many(&self, fields: &[SnippetFields]) -> Result<Vec<i64>, SnippetError> {
        fields.iter().map(|f| self.create(f)).collect()
    }
}
