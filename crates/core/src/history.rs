//! Persisted record of previously discovered codes, keyed by century
//!
//! The file is a flat JSON object `{ "<century>": ["<code>", ...] }`. It is
//! read once when the history is opened and rewritten in full, pretty-printed,
//! whenever a new code is recorded. Writes are not atomic; an unreadable or
//! corrupt file is treated as an empty history.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub type HistoryMap = BTreeMap<String, Vec<String>>;

/// Default file name of the history, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "code-history.json";

#[derive(Debug, Clone)]
pub struct CodeHistory {
    path: Option<PathBuf>,
    entries: HistoryMap,
}

impl CodeHistory {
    /// History that lives only in memory and is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: HistoryMap::new(),
        }
    }

    /// Load the history file, degrading to an empty history on any failure.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read(&path) {
            Ok(Some(entries)) => {
                info!(path = %path.display(), centuries = entries.len(), "code history loaded");
                entries
            }
            Ok(None) => {
                debug!(path = %path.display(), "no code history yet");
                HistoryMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), "{}; starting with empty history", e);
                HistoryMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    fn read(path: &Path) -> Result<Option<HistoryMap>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::HistoryUnavailable(format!("read failed: {}", e)))?;
        let entries = serde_json::from_str(&content)
            .map_err(|e| Error::HistoryUnavailable(format!("malformed JSON: {}", e)))?;
        Ok(Some(entries))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &HistoryMap {
        &self.entries
    }

    /// Codes recorded for a century, oldest first.
    pub fn codes(&self, century: &str) -> &[String] {
        self.entries.get(century).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Oldest recorded code for a century.
    pub fn first(&self, century: &str) -> Option<&str> {
        self.codes(century).first().map(String::as_str)
    }

    pub fn contains(&self, century: &str, code: &str) -> bool {
        self.codes(century).iter().any(|c| c == code)
    }

    /// Append a code if not already present. Returns whether it was new.
    pub fn insert(&mut self, century: &str, code: &str) -> bool {
        let codes = self.entries.entry(century.to_string()).or_default();
        if codes.iter().any(|c| c == code) {
            return false;
        }
        codes.push(code.to_string());
        true
    }

    /// Insert and persist when the code is new. Persistence failures are logged.
    pub fn record(&mut self, century: &str, code: &str) -> bool {
        let inserted = self.insert(century, code);
        if inserted {
            if let Err(e) = self.save() {
                warn!("{}", e);
            }
        }
        inserted
    }

    /// Rewrite the whole history file.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::HistoryUnavailable(format!("write failed: {}", e)))?;
        }
        std::fs::write(path, json)
            .map_err(|e| Error::HistoryUnavailable(format!("write failed: {}", e)))?;
        debug!(path = %path.display(), "code history saved");
        Ok(())
    }

    /// Drop every code recorded for one century, or all of them.
    pub fn clear(&mut self, century: Option<&str>) -> Result<()> {
        match century {
            Some(c) => {
                self.entries.remove(c);
            }
            None => self.entries.clear(),
        }
        self.save()
    }
}
