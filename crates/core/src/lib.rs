//! Scriptorium Core Library
//!
//! Code extraction from downloaded manuscripts, the persisted code history,
//! the cipher challenge solver and its HTTP client, and the unlock chain that
//! ties them together for the portal drivers.

pub mod api;
pub mod century;
pub mod chain;
pub mod challenge;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod orchestrator;
pub mod patterns;

// Re-export commonly used types
pub use api::ChallengeClient;
pub use century::{Century, CODE_NOT_FOUND};
pub use chain::{ChallengeSource, PortalDriver, StageKind, StageOutcome, UnlockChain, UnlockContext};
pub use challenge::{solve, ChallengePayload};
pub use config::{ApiConfig, PathsConfig, ScriptoriumConfig};
pub use error::{Error, Result};
pub use extract::{BinaryPatternExtractor, CodeExtractor, PdfTextExtractor, RawTextExtractor};
pub use history::CodeHistory;
pub use orchestrator::{CodeOrchestrator, CodeSource, ExtractionOutcome};

/// Scriptorium version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default config file path
pub fn default_config_path() -> std::path::PathBuf {
    std::path::PathBuf::from("scriptorium.toml")
}
