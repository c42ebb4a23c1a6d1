//! SQLite database layer for snippet storage
//!
//! Single `commands` table; tags are stored as a JSON array string produced by
//! `TagSet::to_json`. Uses r2d2 connection pooling so reads do not block on a
//! mutex.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use thiserror::Error;

use crate::interface::{SnippetError, SnippetRepository};
use crate::models::{Snippet, SnippetFields, DEFAULT_LANGUAGE};
use crate::tags::TagSet;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

const SELECT_COLUMNS: &str = "id, title, body, description, tags, language, created_at, updated_at";

/// Columns added after the first schema, with their definitions
const ADDED_COLUMNS: [(&str, &str); 2] = [
    ("description", "TEXT DEFAULT ''"),
    ("language", "TEXT DEFAULT 'plaintext'"),
];

/// Timestamps are stored as RFC 3339 with millisecond precision so that text
/// ordering matches time ordering.
fn format_db_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse timestamp string from database to DateTime<Utc>
fn parse_db_timestamp(timestamp_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S"))
                .map(|dt| Utc.from_utc_datetime(&dt))
        })
        .unwrap_or_else(|_| Utc::now())
}

fn stored_language(language: &str) -> &str {
    if language.trim().is_empty() {
        DEFAULT_LANGUAGE
    } else {
        language
    }
}

/// Thread-safe database wrapper using connection pooling
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with connection pooling
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA cache_size=-8000;
                ")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory();

        // In-memory needs single connection to maintain state
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                description TEXT DEFAULT '',
                tags TEXT DEFAULT '[]',
                language TEXT DEFAULT 'plaintext',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_commands_updated ON commands(updated_at);
        "#)?;

        Self::migrate_columns(&conn)?;
        Ok(())
    }

    /// Older databases predate the description and language columns.
    fn migrate_columns(conn: &rusqlite::Connection) -> DatabaseResult<()> {
        for (column, definition) in ADDED_COLUMNS {
            let exists = conn
                .prepare(&format!("SELECT {} FROM commands LIMIT 0", column))
                .is_ok();
            if !exists {
                conn.execute_batch(&format!(
                    "ALTER TABLE commands ADD COLUMN {} {}",
                    column, definition
                ))?;
                tracing::info!(column, "added column to commands table");
            }
        }
        Ok(())
    }

    /// Get total number of snippets in the database
    pub fn count(&self) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM commands", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All snippets, most recently updated first
    pub fn fetch_all(&self) -> DatabaseResult<Vec<Snippet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM commands ORDER BY updated_at DESC, id DESC",
            SELECT_COLUMNS
        ))?;
        let snippets = stmt
            .query_map([], Self::row_to_snippet)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snippets)
    }

    pub fn fetch(&self, id: i64) -> DatabaseResult<Option<Snippet>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM commands WHERE id = ?1", SELECT_COLUMNS),
            [id],
            Self::row_to_snippet,
        );
        match result {
            Ok(snippet) => Ok(Some(snippet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a snippet stamped with the current time. Returns the new id.
    pub fn insert(&self, fields: &SnippetFields) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, fields, Utc::now())
    }

    /// Insert several snippets in one transaction; nothing is written if any
    /// insert fails.
    pub fn insert_many(&self, fields: &[SnippetFields]) -> DatabaseResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now();
        let ids = fields
            .iter()
            .map(|f| Self::insert_with(&tx, f, now))
            .collect::<DatabaseResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
    }

    fn insert_with(
        conn: &rusqlite::Connection,
        fields: &SnippetFields,
        now: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let timestamp = format_db_timestamp(now);
        conn.execute(
            r#"INSERT INTO commands
                   (title, body, description, tags, language, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)"#,
            params![
                fields.title,
                fields.body,
                fields.description,
                fields.tags.to_json(),
                stored_language(&fields.language),
                timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace all editable fields. `updated_at` moves to now but never
    /// before `created_at`. Returns false if no row has this id.
    pub fn update(&self, id: i64, fields: &SnippetFields) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"UPDATE commands
               SET title = ?1, body = ?2, description = ?3, tags = ?4, language = ?5,
                   updated_at = MAX(?6, created_at)
               WHERE id = ?7"#,
            params![
                fields.title,
                fields.body,
                fields.description,
                fields.tags.to_json(),
                stored_language(&fields.language),
                format_db_timestamp(Utc::now()),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete by id. Returns false if no row has this id.
    pub fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM commands WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Insert a welcome snippet when the table is empty. Returns whether it did.
    pub fn seed_welcome(&self) -> DatabaseResult<bool> {
        if self.count()? > 0 {
            return Ok(false);
        }
        let welcome = SnippetFields::new(
            "Welcome to SnipForge!",
            "Snippets can be plain text or markdown. Add variables with {{variable name}} \
             and fill them in when you copy the snippet.",
        )
        .with_description("Descriptions support markdown too.")
        .with_language("markdown")
        .with_tags(["snipforge", "welcome"]);
        self.insert(&welcome)?;
        tracing::info!("seeded empty database with welcome snippet");
        Ok(true)
    }

    fn row_to_snippet(row: &rusqlite::Row) -> rusqlite::Result<Snippet> {
        let id: i64 = row.get(0)?;
        let tags_json: Option<String> = row.get(4)?;
        let language: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;

        let tags = match tags_json.as_deref() {
            None => TagSet::new(),
            Some(json) => TagSet::try_from_json(json).unwrap_or_else(|e| {
                tracing::warn!(
                    id,
                    error = %e,
                    "stored tags are not a JSON string array; treating as untagged"
                );
                TagSet::new()
            }),
        };

        Ok(Snippet {
            id,
            title: row.get(1)?,
            body: row.get(2)?,
            description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            language: stored_language(language.as_deref().unwrap_or_default()).to_string(),
            tags,
            created_at: parse_db_timestamp(&created_at),
            updated_at: parse_db_timestamp(&updated_at),
        })
    }
}

impl SnippetRepository for Database {
    fn list_all(&self) -> Result<Vec<Snippet>, SnippetError> {
        Ok(self.fetch_all()?)
    }

    fn create(&self, fields: &SnippetFields) -> Result<i64, SnippetError> {
        Ok(self.insert(fields)?)
    }

    fn update(&self, id: i64, fields: &SnippetFields) -> Result<bool, SnippetError> {
        Ok(Database::update(self, id, fields)?)
    }

    fn delete(&self, id: i64) -> Result<bool, SnippetError> {
        Ok(Database::delete(self, id)?)
    }

    fn create_many(&self, fields: &[SnippetFields]) -> Result<Vec<i64>, SnippetError> {
        Ok(self.insert_many(fields)?)
    }
}
