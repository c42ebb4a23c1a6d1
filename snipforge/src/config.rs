//! Settings file
//!
//! A JSON document holding the database location, ranker tuning and
//! autocomplete options. A missing file means defaults; unknown keys are
//! rejected so typos surface instead of being ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::interface::{AutocompleteOptions, SnippetError};
use crate::ranking::RankerConfig;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite file; `None` lets the caller pick its default location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub ranker: RankerConfig,
    pub autocomplete: AutocompleteOptions,
    /// How many tags `suggest` returns
    pub suggestion_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            ranker: RankerConfig::default(),
            autocomplete: AutocompleteOptions::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SnippetError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SnippetError::Config(format!("failed to read {}: {e}", path.display())));
            }
        };
        serde_json::from_str(&contents).map_err(|e| {
            SnippetError::Config(format!("invalid settings in {}: {e}", path.display()))
        })
    }

    /// Write settings to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), SnippetError> {
        let io_err = |e: std::io::Error| {
            SnippetError::Config(format!("failed to write {}: {e}", path.display()))
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SnippetError::Config(e.to_string()))?;

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        std::fs::write(&tmp_path, json.as_bytes()).map_err(io_err)?;
        std::fs::rename(&tmp_path, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
