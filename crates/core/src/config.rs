//! Scriptorium configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_FILE;

pub const ENV_API_URL: &str = "SCRIPTORIUM_API_URL";
pub const ENV_API_TOKEN: &str = "SCRIPTORIUM_API_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptoriumConfig {
    /// Filesystem locations
    pub paths: PathsConfig,

    /// Remote challenge API
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON file holding previously discovered codes
    pub history_file: PathBuf,

    /// Directory where manuscripts are downloaded
    pub downloads_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the challenge backend
    pub base_url: String,

    /// Path of the challenge endpoint
    pub challenge_path: String,

    /// Request timeout
    pub timeout_ms: u64,

    pub user_agent: String,

    /// Bearer token, sent only when set
    pub token: Option<String>,

    /// Substitute `fallback_passwords` when the challenge cannot be solved.
    /// Off unless explicitly enabled.
    pub allow_fallback_codes: bool,

    /// Per-century passwords used under `allow_fallback_codes`
    pub fallback_passwords: BTreeMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            challenge_path: "/api/cipher/challenge".to_string(),
            timeout_ms: 10_000,
            user_agent: format!("scriptorium/{}", env!("CARGO_PKG_VERSION")),
            token: None,
            allow_fallback_codes: false,
            fallback_passwords: BTreeMap::new(),
        }
    }
}

impl ApiConfig {
    pub fn challenge_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.challenge_path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("api.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

impl ScriptoriumConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `SCRIPTORIUM_*` environment overrides
    pub fn with_env(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_TOKEN).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.api.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()
    }
}
