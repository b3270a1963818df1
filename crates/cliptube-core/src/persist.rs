//! Persist and restore the "recently opened" history.
//!
//! The file is a JSON array of `{ "id", "title" }` records, newest first,
//! truncated to the configured history size before being written.

use std::path::{Path, PathBuf};

use crate::error::CliptubeError;
use crate::history::History;
use crate::models::HistoryRecord;

/// JSON-backed history file.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read records (newest first). A missing file is an empty history.
    pub fn read(&self) -> Result<Vec<HistoryRecord>, CliptubeError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| CliptubeError::History(e.to_string()))
    }

    /// Build a history with the given capacity from the file.
    ///
    /// Unreadable or corrupt files are logged and treated as empty.
    pub fn load(&self, max_size: usize) -> History {
        match self.read() {
            Ok(records) => {
                tracing::debug!(path = %self.path.display(), records = records.len(), "History loaded");
                History::from_records(max_size, records)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to load history, starting empty");
                History::new(max_size)
            }
        }
    }

    /// Write the history's records (newest first, at most `max_size`).
    pub fn save(&self, history: &History) -> Result<(), CliptubeError> {
        let mut records = history.records();
        records.truncate(history.max_size());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| CliptubeError::History(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
