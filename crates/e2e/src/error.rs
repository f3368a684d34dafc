//! Error types for portal automation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Portal not reachable at {url} after {attempts} attempts")]
    PortalUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Portal action failed: {action} - {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error(transparent)]
    Core(#[from] scriptorium_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl From<E2eError> for scriptorium_core::Error {
    fn from(e: E2eError) -> Self {
        match e {
            E2eError::Core(inner) => inner,
            other => scriptorium_core::Error::Driver(other.to_string()),
        }
    }
}
