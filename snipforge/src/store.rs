//! SnippetStore - main API over a persistence collaborator
//!
//! Holds the current `RankingSession`. Reads reuse it; every mutation that
//! goes through the store drops it so the next read rebuilds from `list_all`.
//!
//! Concurrency Model:
//! - The repository is `Send + Sync`; the SQLite one pools connections
//! - The cached session sits behind a `parking_lot::Mutex` and is handed out as
//!   an `Arc`, so a search never holds the lock while ranking

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::autocomplete;
use crate::config::Settings;
use crate::database::Database;
use crate::interface::{
    AutocompleteOptions, InlineSuggestion, QueryCompletion, SnippetError, SnippetRepository,
    TagCompletion,
};
use crate::models::{Snippet, SnippetFields};
use crate::ranking::RankerConfig;
use crate::search::RankingSession;
use crate::transfer::{self, ExportDocument};
use crate::variables;

pub struct SnippetStore<R: SnippetRepository> {
    repo: R,
    ranker: RankerConfig,
    autocomplete: AutocompleteOptions,
    suggestion_limit: usize,
    session: Mutex<Option<Arc<RankingSession>>>,
}

impl SnippetStore<Database> {
    /// Open (or create) the SQLite database at `path`
    pub fn open<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<Self, SnippetError> {
        let db = Database::open(path)?;
        Ok(Self::with_settings(db, settings))
    }

    /// Create a store with an in-memory database
    pub fn open_in_memory() -> Result<Self, SnippetError> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl<R: SnippetRepository> SnippetStore<R> {
    pub fn new(repo: R) -> Self {
        Self::with_settings(repo, &Settings::default())
    }

    pub fn with_settings(repo: R, settings: &Settings) -> Self {
        Self {
            repo,
            ranker: settings.ranker.clone(),
            autocomplete: settings.autocomplete.clone(),
            suggestion_limit: settings.suggestion_limit,
            session: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// The ranking session for the current collection, built on first use
    /// after a mutation.
    pub fn session(&self) -> Result<Arc<RankingSession>, SnippetError> {
        let mut cached = self.session.lock();
        if let Some(session) = cached.as_ref() {
            return Ok(Arc::clone(session));
        }
        let snippets = self.repo.list_all()?;
        tracing::debug!(snippets = snippets.len(), "rebuilding ranking session");
        let session = Arc::new(RankingSession::with_config(snippets, self.ranker.clone()));
        *cached = Some(Arc::clone(&session));
        Ok(session)
    }

    fn invalidate(&self) {
        self.session.lock().take();
    }

    /// Every snippet, most recently updated first
    pub fn list(&self) -> Result<Vec<Snippet>, SnippetError> {
        Ok(self.session()?.snippets().to_vec())
    }

    pub fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        self.session()?
            .snippets()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(SnippetError::NotFound(id))
    }

    /// Run a raw query: blank → everything, one free-text clause → fuzzy
    /// ranking, anything else → structured filter.
    pub fn search(&self, query: &str) -> Result<Vec<Snippet>, SnippetError> {
        let session = self.session()?;
        let results = session.search(query).into_iter().cloned().collect();
        Ok(results)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create(&self, fields: &SnippetFields) -> Result<i64, SnippetError> {
        validate_fields(fields)?;
        let id = self.repo.create(fields)?;
        self.invalidate();
        tracing::debug!(id, "created snippet");
        Ok(id)
    }

    pub fn update(&self, id: i64, fields: &SnippetFields) -> Result<(), SnippetError> {
        validate_fields(fields)?;
        let found = self.repo.update(id, fields)?;
        self.invalidate();
        if !found {
            return Err(SnippetError::NotFound(id));
        }
        tracing::debug!(id, "updated snippet");
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<(), SnippetError> {
        let found = self.repo.delete(id)?;
        self.invalidate();
        if !found {
            return Err(SnippetError::NotFound(id));
        }
        tracing::debug!(id, "deleted snippet");
        Ok(())
    }

    /// Validate an export document and insert all of its entries, or none.
    /// Returns the number of imported snippets.
    pub fn import_json(&self, json: &str) -> Result<usize, SnippetError> {
        let fields = transfer::parse_import(json)?;
        let ids = self.repo.create_many(&fields)?;
        self.invalidate();
        tracing::info!(count = ids.len(), "imported snippets");
        Ok(ids.len())
    }

    /// Export the snippets carrying every tag in `filter_tags`.
    pub fn export<S: AsRef<str>>(&self, filter_tags: &[S]) -> Result<ExportDocument, SnippetError> {
        let session = self.session()?;
        let document = transfer::export_snippets(session.snippets(), filter_tags, Utc::now());
        tracing::info!(count = document.total_commands, "exported snippets");
        Ok(document)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tags & autocomplete
    // ─────────────────────────────────────────────────────────────────────────

    pub fn tag_vocabulary(&self) -> Result<Vec<String>, SnippetError> {
        Ok(self.session()?.tag_vocabulary())
    }

    pub fn suggest_tags(&self, partial: &str) -> Result<Vec<String>, SnippetError> {
        let vocabulary = self.tag_vocabulary()?;
        Ok(autocomplete::suggest_tags(partial, &vocabulary, self.suggestion_limit))
    }

    pub fn complete_tags(&self, input: &str) -> Result<TagCompletion, SnippetError> {
        let vocabulary = self.tag_vocabulary()?;
        Ok(autocomplete::complete_tag_input(input, &vocabulary, &self.autocomplete))
    }

    pub fn complete_at_cursor(
        &self,
        input: &str,
        cursor: usize,
    ) -> Result<InlineSuggestion, SnippetError> {
        let vocabulary = self.tag_vocabulary()?;
        let separator = &self.autocomplete.separator;
        Ok(autocomplete::complete_at_cursor(input, cursor, &vocabulary, separator))
    }

    pub fn complete_query(
        &self,
        input: &str,
        cursor: usize,
    ) -> Result<QueryCompletion, SnippetError> {
        let vocabulary = self.tag_vocabulary()?;
        Ok(autocomplete::complete_search_query(input, cursor, &vocabulary))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Variables
    // ─────────────────────────────────────────────────────────────────────────

    /// Placeholder names in a snippet's body, in order of first occurrence
    pub fn variables(&self, id: i64) -> Result<Vec<String>, SnippetError> {
        Ok(variables::extract_variables(&self.get(id)?.body))
    }

    /// A snippet's body with the given values substituted
    pub fn fill(&self, id: i64, values: &HashMap<String, String>) -> Result<String, SnippetError> {
        Ok(variables::substitute_variables(&self.get(id)?.body, values))
    }
}

fn validate_fields(fields: &SnippetFields) -> Result<(), SnippetError> {
    if fields.title.trim().is_empty() {
        return Err(SnippetError::InvalidInput("title must not be empty".to_string()));
    }
    if fields.body.trim().is_empty() {
        return Err(SnippetError::InvalidInput("body must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Vec-backed repository that counts `list_all` calls
    #[derive(Default)]
    struct CountingRepo {
        rows: Mutex<Vec<Snippet>>,
        next_id: AtomicUsize,
        list_calls: AtomicUsize,
    }

    impl SnippetRepository for CountingRepo {
        fn list_all(&self) -> Result<Vec<Snippet>, SnippetError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().clone())
        }

        fn create(&self, fields: &SnippetFields) -> Result<i64, SnippetError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            self.rows.lock().insert(0, Snippet::from_fields(id, fields.clone()));
            Ok(id)
        }

        fn update(&self, id: i64, fields: &SnippetFields) -> Result<bool, SnippetError> {
            let mut rows = self.rows.lock();
            let Some(row) = rows.iter_mut().find(|s| s.id == id) else {
                return Ok(false);
            };
            let created_at = row.created_at;
            *row = Snippet {
                created_at,
                ..Snippet::from_fields(id, fields.clone())
            };
            Ok(true)
        }

        fn delete(&self, id: i64) -> Result<bool, SnippetError> {
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|s| s.id != id);
            Ok(rows.len() != before)
        }
    }

    fn fields(title: &str, body: &str, tags: &[&str]) -> SnippetFields {
        SnippetFields::new(title, body).with_tags(tags.iter().copied())
    }

    #[test]
    fn test_session_reused_until_mutation() {
        let store = SnippetStore::new(CountingRepo::default());
        store.create(&fields("Git status", "git status", &["git"])).unwrap();

        let first = store.session().unwrap();
        store.search("git").unwrap();
        store.search("status").unwrap();
        store.tag_vocabulary().unwrap();
        assert_eq!(store.repository().list_calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &store.session().unwrap()));

        store.create(&fields("Docker ps", "docker ps", &["docker"])).unwrap();
        let second = store.session().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.repository().list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_search_sees_mutations() {
        let store = SnippetStore::new(CountingRepo::default());
        let id = store.create(&fields("Deploy", "make deploy", &["ops"])).unwrap();
        assert_eq!(store.search("deploy").unwrap().len(), 1);

        store.update(id, &fields("Release", "make release", &["ops"])).unwrap();
        assert!(store.search("deploy").unwrap().is_empty());
        assert_eq!(store.search("tag:ops").unwrap()[0].title, "Release");

        store.delete(id).unwrap();
        assert!(store.search("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let store = SnippetStore::new(CountingRepo::default());
        assert!(matches!(store.update(5, &fields("a", "b", &[])), Err(SnippetError::NotFound(5))));
        assert!(matches!(store.delete(5), Err(SnippetError::NotFound(5))));
        assert!(matches!(store.get(5), Err(SnippetError::NotFound(5))));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let store = SnippetStore::new(CountingRepo::default());
        assert!(matches!(
            store.create(&fields("  ", "b", &[])),
            Err(SnippetError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create(&fields("a", "", &[])),
            Err(SnippetError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_search_modes() {
        let store = SnippetStore::open_in_memory().unwrap();
        store.create(&fields("SSH connect", "ssh {{user}}@{{host}}", &["ssh", "remote"])).unwrap();
        store.create(&fields("Git status", "git status", &["git"])).unwrap();

        assert_eq!(store.search("").unwrap().len(), 2);
        assert!(store.search("tag:git|title:ssh").unwrap().is_empty());
        assert_eq!(store.search("tag:remote").unwrap()[0].title, "SSH connect");
        // fuzzy mode tolerates a typo
        assert_eq!(store.search("stauts").unwrap()[0].title, "Git status");
    }

    #[test]
    fn test_autocomplete_uses_vocabulary() {
        let store = SnippetStore::open_in_memory().unwrap();
        store.create(&fields("a", "a", &["system", "docker"])).unwrap();
        store.create(&fields("b", "b", &["github"])).unwrap();

        assert_eq!(store.tag_vocabulary().unwrap(), vec!["docker", "github", "system"]);
        assert_eq!(store.suggest_tags("").unwrap().len(), 3);

        let completion = store.complete_tags("github,docker,sys").unwrap();
        assert_eq!(completion.completed, "github, docker, system, ");

        let inline = store.complete_at_cursor("gi", 2).unwrap();
        assert_eq!(inline.completion_text.as_deref(), Some("thub"));

        let query = store.complete_query("title:x|tag:do", 14).unwrap();
        assert_eq!(query.completed.as_deref(), Some("title:x|tag:docker"));
    }

    #[test]
    fn test_variables_and_fill() {
        let store = SnippetStore::open_in_memory().unwrap();
        let id = store.create(&fields("ssh", "ssh {{username}}@{{server address}}", &[])).unwrap();
        assert_eq!(store.variables(id).unwrap(), vec!["username", "server address"]);

        let values = HashMap::from([("username".to_string(), "al".to_string())]);
        assert_eq!(store.fill(id, &values).unwrap(), "ssh al@{{server address}}");
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let store = SnippetStore::open_in_memory().unwrap();
        let bad = r#"{"version": "2.0", "commands": [
            {"title": "a", "body": "b"},
            {"title": "c"}
        ]}"#;
        assert!(matches!(store.import_json(bad), Err(SnippetError::Import(_))));
        assert!(store.list().unwrap().is_empty());

        let good = r#"{"version": "2.0", "commands": [
            {"title": "a", "body": "b", "tags": ["X"]}
        ]}"#;
        assert_eq!(store.import_json(good).unwrap(), 1);
        assert_eq!(store.tag_vocabulary().unwrap(), vec!["x"]);
    }

    #[test]
    fn test_export_filters_by_tags() {
        let store = SnippetStore::open_in_memory().unwrap();
        store.create(&fields("a", "a", &["git"])).unwrap();
        store.create(&fields("b", "b", &["docker"])).unwrap();

        let empty: [&str; 0] = [];
        assert_eq!(store.export(&empty).unwrap().total_commands, 2);
        let doc = store.export(&["git"]).unwrap();
        assert_eq!(doc.total_commands, 1);
        assert_eq!(doc.commands[0].title, "a");
    }
}
