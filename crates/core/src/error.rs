//! Error types for Scriptorium

use thiserror::Error;

/// Result type alias using Scriptorium Error
pub type Result<T> = std::result::Result<T, Error>;

/// Scriptorium error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A single extraction strategy failed; recovered by the next strategy.
    #[error("Extraction failed in {extractor}: {reason}")]
    ExtractionFailure { extractor: String, reason: String },

    /// The code history file could not be read or written.
    #[error("Code history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("Remote challenge error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    RemoteChallenge { status: Option<u16>, message: String },

    #[error("Unknown century: {0}")]
    UnknownCentury(String),

    #[error("Century {century} requires the code of century {needs}")]
    MissingPrerequisite { century: String, needs: String },

    #[error("Portal driver error: {0}")]
    Driver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether a fallback password policy may stand in for this failure.
    ///
    /// Transport, remote and malformed-challenge failures qualify; local
    /// IO or configuration problems never do.
    pub fn is_challenge_failure(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::RemoteChallenge { .. } | Error::MalformedChallenge(_)
        )
    }
}
