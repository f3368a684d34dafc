//! Text extractors: interchangeable strategies that pull a code out of a file
//!
//! Every strategy reports failure as `None` so the orchestrator can move on
//! to the next one. Internally each works in terms of `Result`; the error is
//! logged at the trait boundary and never propagated.

use std::fs::File;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::patterns::{find_binary_code, find_code};

/// Number of leading bytes the raw-text scan looks at.
pub const RAW_SCAN_LIMIT: usize = 10_000;

/// A strategy for extracting a code from a downloaded file.
pub trait CodeExtractor: Send + Sync {
    /// Short name used in logs and outcome reports.
    fn name(&self) -> &'static str;

    /// Extract a code, surfacing read/parse problems as errors.
    fn try_extract(&self, path: &Path, century: &str) -> Result<Option<String>>;

    /// Extract a code; errors are logged and reported as `None`.
    fn extract(&self, path: &Path, century: &str) -> Option<String> {
        match self.try_extract(path, century) {
            Ok(Some(code)) => {
                debug!(extractor = self.name(), %code, "code found");
                Some(code)
            }
            Ok(None) => {
                debug!(extractor = self.name(), "no code matched");
                None
            }
            Err(e) => {
                warn!(extractor = self.name(), path = %path.display(), "{}", e);
                None
            }
        }
    }
}

fn failure(extractor: &str, reason: impl ToString) -> Error {
    Error::ExtractionFailure {
        extractor: extractor.to_string(),
        reason: reason.to_string(),
    }
}

/// Decodes the file as a PDF document and matches its plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl CodeExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdf-text"
    }

    fn try_extract(&self, path: &Path, century: &str) -> Result<Option<String>> {
        let bytes = std::fs::read(path).map_err(|e| failure(self.name(), e))?;

        // The PDF decoder panics on some malformed inputs.
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }))
        .map_err(|_| failure(self.name(), "PDF decoder panicked"))?
        .map_err(|e| failure(self.name(), e))?;

        Ok(find_code(&decoded, century))
    }
}

/// Scans the first [`RAW_SCAN_LIMIT`] bytes as UTF-8 text.
#[derive(Debug, Clone, Copy)]
pub struct RawTextExtractor {
    limit: usize,
}

impl Default for RawTextExtractor {
    fn default() -> Self {
        Self { limit: RAW_SCAN_LIMIT }
    }
}

impl RawTextExtractor {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

impl CodeExtractor for RawTextExtractor {
    fn name(&self) -> &'static str {
        "raw-text"
    }

    fn try_extract(&self, path: &Path, century: &str) -> Result<Option<String>> {
        let file = File::open(path).map_err(|e| failure(self.name(), e))?;
        let mut buf = Vec::with_capacity(self.limit.min(64 * 1024));
        file.take(self.limit as u64)
            .read_to_end(&mut buf)
            .map_err(|e| failure(self.name(), e))?;

        let text = String::from_utf8_lossy(&buf);
        Ok(find_code(&text, century))
    }
}

/// Scans the whole file as bytes against the narrow literal-prefix patterns.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryPatternExtractor;

impl CodeExtractor for BinaryPatternExtractor {
    fn name(&self) -> &'static str {
        "binary-pattern"
    }

    fn try_extract(&self, path: &Path, century: &str) -> Result<Option<String>> {
        let bytes = std::fs::read(path).map_err(|e| failure(self.name(), e))?;
        Ok(find_binary_code(&bytes, century))
    }
}

/// The standard priority order: structured parse, bounded raw scan, full binary scan.
pub fn default_chain() -> Vec<Box<dyn CodeExtractor>> {
    vec![
        Box::new(PdfTextExtractor),
        Box::new(RawTextExtractor::default()),
        Box::new(BinaryPatternExtractor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_none_for_every_strategy() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("absent.pdf");
        for extractor in default_chain() {
            assert_eq!(extractor.extract(&missing, "XIV"), None, "{}", extractor.name());
        }
    }

    #[test]
    fn test_pdf_extractor_rejects_non_pdf() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "plain.txt", b"Code: AUREUS1350");
        assert!(PdfTextExtractor.try_extract(&path, "XIV").is_err());
        assert_eq!(PdfTextExtractor.extract(&path, "XIV"), None);
    }

    #[test]
    fn test_raw_text_reads_plain_file() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "plain.txt", b"header\n\nseal diazepam850 end");
        assert_eq!(
            RawTextExtractor::default().extract(&path, "XV").as_deref(),
            Some("DIAZEPAM850")
        );
    }

    #[test]
    fn test_raw_text_tolerates_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = vec![0xc3, 0x28, 0xff, b' '];
        bytes.extend_from_slice(b"SERAPH1520");
        let path = write(&tmp, "mixed.bin", &bytes);
        assert_eq!(
            RawTextExtractor::default().extract(&path, "XVI").as_deref(),
            Some("SERAPH1520")
        );
    }

    #[test]
    fn test_raw_text_limit_is_configurable() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "short.txt", b"..........MALLEUS1692");
        assert_eq!(RawTextExtractor::with_limit(10).extract(&path, "XVIII"), None);
        assert!(RawTextExtractor::with_limit(64).extract(&path, "XVIII").is_some());
    }

    #[test]
    fn test_binary_extractor_handles_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = vec![0x80; 32];
        bytes.extend_from_slice(b"NECRO6660");
        bytes.extend_from_slice(&[0xfe, 0xff]);
        let path = write(&tmp, "blob.bin", &bytes);
        assert_eq!(BinaryPatternExtractor.extract(&path, "XVII").as_deref(), Some("NECRO6660"));
    }
}
