//! Extraction orchestrator: strategy chain, then history, then backup table

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::century::{backup_code, CODE_NOT_FOUND};
use crate::extract::{default_chain, CodeExtractor};
use crate::history::CodeHistory;

/// Where a returned code came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "extractor", rename_all = "snake_case")]
pub enum CodeSource {
    Extractor(String),
    History,
    Backup,
    NotFound,
}

impl fmt::Display for CodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeSource::Extractor(name) => write!(f, "extractor:{}", name),
            CodeSource::History => write!(f, "history"),
            CodeSource::Backup => write!(f, "backup"),
            CodeSource::NotFound => write!(f, "not-found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub century: String,
    pub code: String,
    pub source: CodeSource,
}

pub struct CodeOrchestrator {
    extractors: Vec<Box<dyn CodeExtractor>>,
    history: CodeHistory,
}

impl CodeOrchestrator {
    /// Orchestrator with the standard extractor chain.
    pub fn new(history: CodeHistory) -> Self {
        Self::with_extractors(history, default_chain())
    }

    /// Load history from `path` and use the standard extractor chain.
    pub fn open(history_path: impl Into<PathBuf>) -> Self {
        Self::new(CodeHistory::open(history_path))
    }

    pub fn with_extractors(history: CodeHistory, extractors: Vec<Box<dyn CodeExtractor>>) -> Self {
        Self { extractors, history }
    }

    pub fn history(&self) -> &CodeHistory {
        &self.history
    }

    /// Always returns a usable code string.
    pub fn extract_code(&mut self, path: &Path, century: &str) -> String {
        self.extract_code_detailed(path, century).code
    }

    pub fn extract_code_detailed(&mut self, path: &Path, century: &str) -> ExtractionOutcome {
        info!(century, path = %path.display(), "extracting code");

        let found = self.extractors.iter().find_map(|extractor| {
            extractor
                .extract(path, century)
                .filter(|code| !code.is_empty() && code != CODE_NOT_FOUND)
                .map(|code| (extractor.name(), code))
        });

        if let Some((name, code)) = found {
            if self.history.record(century, &code) {
                info!(century, %code, "new code recorded in history");
            }
            info!(century, %code, extractor = name, "code extracted");
            return ExtractionOutcome {
                century: century.to_string(),
                code,
                source: CodeSource::Extractor(name.to_string()),
            };
        }

        if let Some(code) = self.history.first(century) {
            warn!(century, code, "all extractors failed; using oldest recorded code");
            return ExtractionOutcome {
                century: century.to_string(),
                code: code.to_string(),
                source: CodeSource::History,
            };
        }

        match backup_code(century) {
            Some(code) => {
                warn!(century, code, "no history; using backup code");
                ExtractionOutcome {
                    century: century.to_string(),
                    code: code.to_string(),
                    source: CodeSource::Backup,
                }
            }
            None => {
                warn!(century, "unrecognized century and no history; code not found");
                ExtractionOutcome {
                    century: century.to_string(),
                    code: CODE_NOT_FOUND.to_string(),
                    source: CodeSource::NotFound,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::century::Century;
    use crate::error::Result;
    use tempfile::TempDir;
    use test_case::test_case;

    /// Extractor that always answers with a fixed value.
    struct Fixed(&'static str, Option<&'static str>);

    impl CodeExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn try_extract(&self, _path: &Path, _century: &str) -> Result<Option<String>> {
            Ok(self.1.map(String::from))
        }
    }

    fn blank_file(tmp: &TempDir) -> PathBuf {
        let path = tmp.path().join("blank.txt");
        std::fs::write(&path, "nothing to see here").unwrap();
        path
    }

    #[test_case(Century::XIV)]
    #[test_case(Century::XV)]
    #[test_case(Century::XVI)]
    #[test_case(Century::XVII)]
    #[test_case(Century::XVIII)]
    fn test_backup_when_nothing_matches(century: Century) {
        let tmp = TempDir::new().unwrap();
        let file = blank_file(&tmp);
        let mut orch = CodeOrchestrator::open(tmp.path().join("h.json"));

        let outcome = orch.extract_code_detailed(&file, century.as_str());
        assert_eq!(outcome.code, century.backup_code());
        assert_eq!(outcome.source, CodeSource::Backup);
        // Backup codes are not discoveries.
        assert!(orch.history().codes(century.as_str()).is_empty());
    }

    #[test]
    fn test_unknown_century_without_history_is_sentinel() {
        let tmp = TempDir::new().unwrap();
        let file = blank_file(&tmp);
        let mut orch = CodeOrchestrator::new(CodeHistory::in_memory());
        assert_eq!(orch.extract_code(&file, "XIX"), CODE_NOT_FOUND);
    }

    #[test]
    fn test_history_before_backup() {
        let tmp = TempDir::new().unwrap();
        let file = blank_file(&tmp);
        let mut history = CodeHistory::in_memory();
        history.insert("XV", "DIAZEPAM111");
        history.insert("XV", "DIAZEPAM222");

        let mut orch = CodeOrchestrator::new(history);
        let outcome = orch.extract_code_detailed(&file, "XV");
        assert_eq!(outcome.code, "DIAZEPAM111");
        assert_eq!(outcome.source, CodeSource::History);
    }

    #[test]
    fn test_extraction_is_idempotent_in_history() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("code.txt");
        std::fs::write(&path, "the seal reads SERAPH1520").unwrap();
        let history_path = tmp.path().join("h.json");

        let mut orch = CodeOrchestrator::open(&history_path);
        assert_eq!(orch.extract_code(&path, "XVI"), "SERAPH1520");
        assert_eq!(orch.extract_code(&path, "XVI"), "SERAPH1520");
        assert_eq!(orch.history().codes("XVI"), ["SERAPH1520"]);
        assert_eq!(CodeHistory::open(&history_path).codes("XVI"), ["SERAPH1520"]);
    }

    #[test]
    fn test_sentinel_and_empty_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let file = blank_file(&tmp);
        let extractors: Vec<Box<dyn CodeExtractor>> = vec![
            Box::new(Fixed("sentinel", Some(CODE_NOT_FOUND))),
            Box::new(Fixed("empty", Some(""))),
            Box::new(Fixed("miss", None)),
            Box::new(Fixed("hit", Some("MALLEUS1692"))),
        ];
        let mut orch = CodeOrchestrator::with_extractors(CodeHistory::in_memory(), extractors);

        let outcome = orch.extract_code_detailed(&file, "XVIII");
        assert_eq!(outcome.code, "MALLEUS1692");
        assert_eq!(outcome.source, CodeSource::Extractor("hit".to_string()));
    }

    #[test]
    fn test_first_successful_extractor_wins() {
        let tmp = TempDir::new().unwrap();
        let file = blank_file(&tmp);
        let extractors: Vec<Box<dyn CodeExtractor>> = vec![
            Box::new(Fixed("first", Some("AUREUS0001"))),
            Box::new(Fixed("second", Some("AUREUS0002"))),
        ];
        let mut orch = CodeOrchestrator::with_extractors(CodeHistory::in_memory(), extractors);
        assert_eq!(orch.extract_code(&file, "XIV"), "AUREUS0001");
    }
}
