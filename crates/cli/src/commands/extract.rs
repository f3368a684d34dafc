//! Extract Command

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use scriptorium_core::{Century, CodeOrchestrator, CodeSource, ExtractionOutcome, ScriptoriumConfig};

use crate::output::{print_item, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ExtractArgs {
    /// Downloaded manuscript (PDF)
    pub file: PathBuf,

    /// Century the manuscript belongs to (XIV..XVIII)
    #[arg(short, long)]
    pub century: Century,
}

#[derive(Serialize)]
pub struct OutcomeDisplay {
    pub century: String,
    pub code: String,
    pub source: CodeSource,
}

impl From<ExtractionOutcome> for OutcomeDisplay {
    fn from(outcome: ExtractionOutcome) -> Self {
        Self {
            century: outcome.century,
            code: outcome.code,
            source: outcome.source,
        }
    }
}

impl TableDisplay for OutcomeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Century", "Code", "Source"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.century.clone(), self.code.clone(), self.source.to_string()]
    }
}

/// Warning shown when the code did not come from the manuscript itself.
fn fallback_note(outcome: &ExtractionOutcome) -> Option<String> {
    match &outcome.source {
        CodeSource::Extractor(_) => None,
        source => Some(format!("no code found in the manuscript; using {} code", source)),
    }
}

pub fn execute(args: &ExtractArgs, config: &ScriptoriumConfig, format: OutputFormat) -> Result<()> {
    if !args.file.is_file() {
        bail!("manuscript not found: {}", args.file.display());
    }

    let mut orchestrator = CodeOrchestrator::open(&config.paths.history_file);
    let outcome = orchestrator.extract_code_detailed(&args.file, args.century.as_str());
    if let Some(note) = fallback_note(&outcome) {
        print_warning(&note);
    }

    print_item(&OutcomeDisplay::from(outcome), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::CodeHistory;

    #[test]
    fn test_typed_century_always_yields_a_code() {
        let tmp = tempfile::tempdir().unwrap();
        let blank = tmp.path().join("blank.pdf");
        std::fs::write(&blank, "sin sello").unwrap();

        let mut orchestrator = CodeOrchestrator::new(CodeHistory::in_memory());
        for century in Century::ALL {
            let outcome = orchestrator.extract_code_detailed(&blank, century.as_str());
            assert_eq!(outcome.source, CodeSource::Backup);
            assert_eq!(outcome.code, century.backup_code());
            assert_eq!(
                fallback_note(&outcome).as_deref(),
                Some("no code found in the manuscript; using backup code")
            );
        }
    }

    #[test]
    fn test_extracted_code_has_no_note() {
        let outcome = ExtractionOutcome {
            century: "XIV".into(),
            code: "AUREUS1350".into(),
            source: CodeSource::Extractor("raw-text".into()),
        };
        assert_eq!(fallback_note(&outcome), None);
    }
}
