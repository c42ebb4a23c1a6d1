//! SnipForge Core - search & tagging for a personal snippet manager
//!
//! Query parsing with typed prefixes, tag normalization and matching, weighted
//! fuzzy ranking, tag autocomplete and `{{variable}}` substitution, plus the
//! SQLite collaborator and JSON import/export around them.

pub mod autocomplete;
pub(crate) mod candidate;
pub mod config;
pub mod database;
pub mod filter;
pub mod interface;
pub mod models;
pub mod query;
pub mod ranking;
pub mod search;
mod store;
pub mod tags;
pub mod transfer;
pub mod variables;

pub use interface::*;
pub use models::{Snippet, SnippetFields};
pub use search::RankingSession;
pub use store::SnippetStore;
pub use tags::TagSet;
