//! Core data models for SnipForge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tags::TagSet;

/// Language assigned when none is given
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// A stored snippet. Owned by the persistence collaborator; the core only
/// reads, filters and ranks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub description: String,
    pub language: String,
    pub tags: TagSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Build a snippet from editable fields, stamped with the current time
    pub fn from_fields(id: i64, fields: SnippetFields) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: fields.title,
            body: fields.body,
            description: fields.description,
            language: fields.language,
            tags: fields.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the body contains at least one `{{name}}` placeholder
    pub fn has_variables(&self) -> bool {
        crate::variables::has_variables(&self.body)
    }

    pub fn fields(&self) -> SnippetFields {
        SnippetFields {
            title: self.title.clone(),
            body: self.body.clone(),
            description: self.description.clone(),
            language: self.language.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Editable part of a snippet, used for create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetFields {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: TagSet,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl SnippetFields {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            description: String::new(),
            language: default_language(),
            tags: TagSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the language; blank values fall back to the default
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.language = if language.trim().is_empty() { default_language() } else { language };
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().collect();
        self
    }
}
