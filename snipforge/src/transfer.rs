//! JSON export / import of snippet collections
//!
//! Export is infallible apart from serialization. Import validates the whole
//! document before anything is handed to persistence: one bad entry rejects
//! the file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::models::{Snippet, SnippetFields, DEFAULT_LANGUAGE};
use crate::tags::{filter_by_tags, normalize_tags, TagSet};

pub const EXPORT_VERSION: &str = "2.0";
pub const MAX_COMMANDS: usize = 50_000;
pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_BODY_LENGTH: usize = 1_000_000;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

const FILENAME_PREFIX: &str = "snipforge-commands";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid export data: not an object")]
    NotAnObject,
    #[error("invalid export data: missing version")]
    MissingVersion,
    #[error("invalid export data: missing or invalid commands array")]
    InvalidCommands,
    #[error("too many commands: {count} (maximum: {max})")]
    TooManyCommands { count: usize, max: usize },
    #[error("invalid command at index {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
    #[error("command at index {index}: {field} is empty or too long")]
    FieldOutOfBounds { index: usize, field: String },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One snippet as written to an export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSnippet {
    pub title: String,
    pub body: String,
    pub description: String,
    pub tags: Vec<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Snippet> for ExportedSnippet {
    fn from(snippet: &Snippet) -> Self {
        let language = if snippet.language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            snippet.language.clone()
        };
        Self {
            title: snippet.title.clone(),
            body: snippet.body.clone(),
            description: snippet.description.clone(),
            tags: snippet.tags.as_slice().to_vec(),
            language,
            created_at: snippet.created_at,
            updated_at: snippet.updated_at,
        }
    }
}

/// Versioned export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub total_commands: usize,
    pub commands: Vec<ExportedSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_tags: Option<Vec<String>>,
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build an export of `snippets`, keeping only those carrying every tag in
/// `filter_tags` (exact match after normalization).
pub fn export_snippets<S: AsRef<str>>(
    snippets: &[Snippet],
    filter_tags: &[S],
    now: DateTime<Utc>,
) -> ExportDocument {
    let commands: Vec<ExportedSnippet> = filter_by_tags(snippets, filter_tags)
        .into_iter()
        .map(ExportedSnippet::from)
        .collect();
    let filter_tags = normalize_tags(filter_tags);

    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        total_commands: commands.len(),
        commands,
        filter_tags: (!filter_tags.is_empty()).then_some(filter_tags),
    }
}

/// `snipforge-commands[_tag1-tag2]_YYYY-MM-DD.json`
pub fn export_filename<S: AsRef<str>>(filter_tags: &[S], date: NaiveDate) -> String {
    let tags = normalize_tags(filter_tags);
    let tag_part = if tags.is_empty() {
        String::new()
    } else {
        format!("_{}", tags.join("-"))
    };
    format!("{FILENAME_PREFIX}{tag_part}_{}.json", date.format("%Y-%m-%d"))
}

/// A command entry as accepted on import. Timestamps and unknown keys are
/// ignored; imported snippets are stamped on insertion.
#[derive(Debug, Deserialize, Validate)]
struct ImportedCommand {
    #[validate(length(min = 1, max = 500), custom = "not_blank")]
    title: String,
    #[validate(length(min = 1, max = 1000000), custom = "not_blank")]
    body: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    language: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl From<ImportedCommand> for SnippetFields {
    fn from(command: ImportedCommand) -> Self {
        SnippetFields {
            title: command.title.trim().to_string(),
            body: command.body.trim().to_string(),
            description: command.description.unwrap_or_default().trim().to_string(),
            language: command
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            tags: TagSet::from(command.tags.unwrap_or_default()),
        }
    }
}

/// Validate an export document and turn its entries into insertable fields.
pub fn parse_import(json: &str) -> Result<Vec<SnippetFields>, ImportError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Object(mut document) = document else {
        return Err(ImportError::NotAnObject);
    };

    match document.get("version") {
        None | Some(Value::Null) => return Err(ImportError::MissingVersion),
        Some(Value::String(v)) if v.is_empty() => return Err(ImportError::MissingVersion),
        Some(_) => {}
    }

    let Some(Value::Array(commands)) = document.remove("commands") else {
        return Err(ImportError::InvalidCommands);
    };
    if commands.len() > MAX_COMMANDS {
        return Err(ImportError::TooManyCommands {
            count: commands.len(),
            max: MAX_COMMANDS,
        });
    }

    commands
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}

fn parse_entry(index: usize, entry: Value) -> Result<SnippetFields, ImportError> {
    if !entry.is_object() {
        return Err(ImportError::InvalidEntry {
            index,
            reason: "not an object".to_string(),
        });
    }
    let command: ImportedCommand = serde_json::from_value(entry)
        .map_err(|e| ImportError::InvalidEntry {
            index,
            reason: e.to_string(),
        })?;

    if let Err(errors) = command.validate() {
        let mut fields: Vec<&str> = errors.field_errors().into_keys().collect();
        fields.sort_unstable();
        let field = fields.first().copied().unwrap_or("command").to_string();
        return Err(ImportError::FieldOutOfBounds { index, field });
    }
    Ok(command.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snippet(id: i64, title: &str, tags: &[&str]) -> Snippet {
        let fields = SnippetFields::new(title, "echo hi").with_tags(tags.iter().copied());
        Snippet::from_fields(id, fields)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_export_without_filter() {
        let snippets = vec![snippet(1, "a", &["git"]), snippet(2, "b", &[])];
        let empty: [&str; 0] = [];
        let doc = export_snippets(&snippets, &empty, now());
        assert_eq!(doc.version, "2.0");
        assert_eq!(doc.total_commands, 2);
        assert_eq!(doc.filter_tags, None);
        assert_eq!(doc.commands[0].language, "plaintext");

        let json = doc.to_json_pretty().unwrap();
        assert!(!json.contains("filter_tags"));
        assert!(json.contains("\"total_commands\": 2"));
    }

    #[test]
    fn test_export_with_filter_is_exact_and_normalized() {
        let snippets = vec![
            snippet(1, "a", &["git", "github"]),
            snippet(2, "b", &["github"]),
            snippet(3, "c", &["digital"]),
        ];
        let doc = export_snippets(&snippets, &[" GIT "], now());
        assert_eq!(doc.total_commands, 1);
        assert_eq!(doc.commands[0].title, "a");
        assert_eq!(doc.commands[0].tags, vec!["git", "github"]);
        assert_eq!(doc.filter_tags, Some(vec!["git".to_string()]));
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(export_filename(&empty, date), "snipforge-commands_2024-05-01.json");
        assert_eq!(
            export_filename(&["Git", "docker"], date),
            "snipforge-commands_git-docker_2024-05-01.json"
        );
    }

    #[test]
    fn test_export_then_import() {
        let snippets = vec![
            Snippet::from_fields(
                1,
                SnippetFields::new("SSH connect", "ssh {{user}}@{{host}}")
                    .with_description("Remote shell")
                    .with_language("bash")
                    .with_tags(["SSH", "remote"]),
            ),
        ];
        let empty: [&str; 0] = [];
        let json = export_snippets(&snippets, &empty, now()).to_json_pretty().unwrap();
        let imported = parse_import(&json).unwrap();
        assert_eq!(imported, vec![snippets[0].fields()]);
    }

    #[test]
    fn test_import_trims_and_defaults() {
        let json = r#"{
            "version": "1.0",
            "commands": [
                {"title": "  List  ", "body": " ls -la \n", "tags": ["Shell", " shell "]},
                {"title": "x", "body": "y", "description": null, "language": ""}
            ]
        }"#;
        let fields = parse_import(json).unwrap();
        assert_eq!(fields[0].title, "List");
        assert_eq!(fields[0].body, "ls -la");
        assert_eq!(fields[0].tags.as_slice(), ["shell"]);
        assert_eq!(fields[0].language, "plaintext");
        assert_eq!(fields[1].description, "");
        assert_eq!(fields[1].language, "plaintext");
    }

    #[test]
    fn test_import_rejects_bad_documents() {
        assert!(matches!(parse_import("[]"), Err(ImportError::NotAnObject)));
        assert!(matches!(parse_import("{"), Err(ImportError::Json(_))));
        assert!(matches!(parse_import(r#"{"commands": []}"#), Err(ImportError::MissingVersion)));
        assert!(matches!(
            parse_import(r#"{"version": "", "commands": []}"#),
            Err(ImportError::MissingVersion)
        ));
        assert!(matches!(parse_import(r#"{"version": "2.0"}"#), Err(ImportError::InvalidCommands)));
        assert!(matches!(
            parse_import(r#"{"version": "2.0", "commands": {}}"#),
            Err(ImportError::InvalidCommands)
        ));
    }

    #[test]
    fn test_import_names_offending_entry() {
        let json = r#"{"version": "2.0", "commands": [
            {"title": "ok", "body": "ok"},
            {"title": "missing body"}
        ]}"#;
        match parse_import(json) {
            Err(ImportError::InvalidEntry { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected: {:?}", other),
        }

        let json = r#"{"version": "2.0", "commands": [7]}"#;
        assert!(matches!(parse_import(json), Err(ImportError::InvalidEntry { index: 0, .. })));

        let json = r#"{"version": "2.0", "commands": [
            {"title": "a", "body": "b", "tags": "git"}
        ]}"#;
        assert!(matches!(parse_import(json), Err(ImportError::InvalidEntry { index: 0, .. })));
    }

    #[test]
    fn test_import_enforces_field_limits() {
        let long_title = "t".repeat(MAX_TITLE_LENGTH + 1);
        let json = serde_json::json!({
            "version": "2.0",
            "commands": [{"title": "fine", "body": "b"}, {"title": long_title, "body": "b"}]
        })
        .to_string();
        match parse_import(&json) {
            Err(ImportError::FieldOutOfBounds { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "title");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let json = r#"{"version": "2.0", "commands": [{"title": "   ", "body": "b"}]}"#;
        assert!(matches!(parse_import(json), Err(ImportError::FieldOutOfBounds { index: 0, .. })));
    }

    #[test]
    fn test_title_limit_counts_chars() {
        let title = "é".repeat(MAX_TITLE_LENGTH);
        let json = serde_json::json!({
            "version": "2.0",
            "commands": [{"title": title, "body": "b"}]
        })
        .to_string();
        assert_eq!(parse_import(&json).unwrap().len(), 1);
    }

    #[test]
    fn test_import_rejects_too_many_commands() {
        let commands: Vec<Value> = (0..=MAX_COMMANDS)
            .map(|_| serde_json::json!({"title": "t", "body": "b"}))
            .collect();
        let json = serde_json::json!({"version": "2.0", "commands": commands}).to_string();
        assert!(matches!(
            parse_import(&json),
            Err(ImportError::TooManyCommands { count, max: MAX_COMMANDS })
                if count == MAX_COMMANDS + 1
        ));
    }
}
