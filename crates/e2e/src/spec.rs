//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use scriptorium_core::Century;

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// A complete unlock scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Where and how to log in
    pub portal: PortalSpec,

    /// DOM selectors for the portal's pages
    #[serde(default)]
    pub selectors: Selectors,

    /// Centuries to unlock; all of them when omitted
    #[serde(default)]
    pub centuries: Option<Vec<Century>>,

    /// Overrides the runner's browser
    #[serde(default)]
    pub browser: Option<Browser>,

    /// Overrides the runner's headless setting
    #[serde(default)]
    pub headless: Option<bool>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSpec {
    pub login_url: String,
    pub portal_url: String,

    #[serde(default)]
    pub email: Option<String>,
    /// Environment variable holding the email, checked when `email` is unset
    #[serde(default)]
    pub email_env: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password, checked when `password` is unset
    #[serde(default)]
    pub password_env: Option<String>,
}

impl PortalSpec {
    pub fn email(&self) -> E2eResult<String> {
        resolve_credential("email", self.email.as_deref(), self.email_env.as_deref())
    }

    pub fn password(&self) -> E2eResult<String> {
        resolve_credential("password", self.password.as_deref(), self.password_env.as_deref())
    }
}

fn resolve_credential(field: &str, literal: Option<&str>, env: Option<&str>) -> E2eResult<String> {
    if let Some(value) = literal.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    match env {
        Some(var) => std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| E2eError::MissingCredential(format!("{} (env {} unset)", field, var))),
        None => Err(E2eError::MissingCredential(field.to_string())),
    }
}

/// Selectors used by the Playwright driver.
///
/// `{century}` in `century_label` is replaced with the roman label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub email_input: String,
    pub password_input: String,
    pub submit_button: String,
    pub manuscript_card: String,
    pub century_label: String,
    pub title: String,
    pub code_input: String,
    pub unlock_button: String,
    pub download_button: String,
    pub dismiss_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            email_input: r#"input[type="email"]"#.to_string(),
            password_input: r#"input[type="password"]"#.to_string(),
            submit_button: r#"button[type="submit"]"#.to_string(),
            manuscript_card: "[data-century]".to_string(),
            century_label: "{century}".to_string(),
            title: "h3".to_string(),
            code_input: "input".to_string(),
            unlock_button: r#"button:has-text("Unlock")"#.to_string(),
            download_button: r#"button:has-text("Download")"#.to_string(),
            dismiss_button: r#"[role="dialog"] button"#.to_string(),
        }
    }
}

impl Selectors {
    pub fn label_for(&self, century: Century) -> String {
        self.century_label.replace("{century}", century.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_ms: u64,
    pub element_ms: u64,
    pub download_ms: u64,
    /// How long to wait for the portal to answer before starting
    pub reachability_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            element_ms: 10_000,
            download_ms: 15_000,
            reachability_ms: 20_000,
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Centuries to process, in chronological order.
    pub fn centuries(&self) -> Vec<Century> {
        let mut centuries = self.centuries.clone().unwrap_or_else(|| Century::ALL.to_vec());
        centuries.sort();
        centuries.dedup();
        centuries
    }

    fn validate(&self) -> E2eResult<()> {
        for (field, url) in [("login_url", &self.portal.login_url), ("portal_url", &self.portal.portal_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(E2eError::ScenarioParse(format!(
                    "portal.{} must be an http(s) URL, got {:?}",
                    field, url
                )));
            }
        }
        if matches!(&self.centuries, Some(c) if c.is_empty()) {
            return Err(E2eError::ScenarioParse("centuries must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_scenario() {
        let yaml = r#"
name: full-chain
portal:
  login_url: https://portal.example.test/login
  portal_url: https://portal.example.test/portal
  email: monk@example.test
  password_env: SCRIPTORIUM_TEST_UNSET_PASSWORD
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "full-chain");
        assert_eq!(spec.centuries(), Century::ALL.to_vec());
        assert_eq!(spec.selectors, Selectors::default());
        assert_eq!(spec.portal.email().unwrap(), "monk@example.test");
        assert!(matches!(spec.portal.password(), Err(E2eError::MissingCredential(_))));
    }

    #[test]
    fn test_parse_custom_selectors_and_subset() {
        let yaml = r#"
name: late-centuries
tags: [challenge]
portal:
  login_url: http://localhost:5173/login
  portal_url: http://localhost:5173/portal
  email: a@b.c
  password: pw
selectors:
  manuscript_card: div.group
  century_label: Siglo {century}
  unlock_button: 'button:has-text("Desbloquear")'
centuries: [XVIII, XVII, XVII]
browser: firefox
headless: false
viewport:
  width: 1920
  height: 1080
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.centuries(), vec![Century::XVII, Century::XVIII]);
        assert_eq!(spec.selectors.label_for(Century::XVII), "Siglo XVII");
        assert_eq!(spec.selectors.manuscript_card, "div.group");
        // Unset selectors keep their defaults.
        assert_eq!(spec.selectors.title, "h3");
        assert_eq!(spec.viewport.width, 1920);
        assert_eq!(spec.browser, Some(Browser::Firefox));
        assert_eq!(spec.headless, Some(false));
        assert_eq!(ScenarioSpec::filter_by_tag(std::slice::from_ref(&spec), "challenge").len(), 1);
    }

    #[test]
    fn test_rejects_bad_url_and_unknown_century() {
        let bad_url = r#"
name: x
portal: { login_url: "portal/login", portal_url: "https://p/portal" }
"#;
        assert!(ScenarioSpec::from_yaml(bad_url).is_err());

        let bad_century = r#"
name: x
portal: { login_url: "https://p/login", portal_url: "https://p/portal" }
centuries: [XX]
"#;
        assert!(ScenarioSpec::from_yaml(bad_century).is_err());
    }

    #[test]
    fn test_load_all_from_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = |name: &str| {
            format!(
                "name: {name}\nportal:\n  login_url: https://p/login\n  portal_url: https://p/portal\n"
            )
        };
        std::fs::write(tmp.path().join("b.yaml"), body("second")).unwrap();
        std::fs::write(tmp.path().join("a.yml"), body("first")).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let specs = ScenarioSpec::load_all(tmp.path()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }
}
