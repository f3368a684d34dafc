//! Playwright portal driver
//!
//! Every portal action becomes a small Node script that reuses the browser
//! storage state written by the previous one, so a login survives across
//! separate `node` processes. Credentials reach the script through its
//! environment and are never written into the script file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use scriptorium_core::{Century, PortalDriver};

use crate::error::{E2eError, E2eResult};
use crate::spec::{PortalSpec, ScenarioSpec, Selectors, Timeouts, Viewport};

const ENV_EMAIL: &str = "SCRIPTORIUM_PORTAL_EMAIL";
const ENV_PASSWORD: &str = "SCRIPTORIUM_PORTAL_PASSWORD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser: {}", other))),
        }
    }
}

/// A single browser-side operation
#[derive(Debug, Clone)]
pub enum PortalAction {
    Login,
    CaptureTitle(Century),
    EnterCode(Century, String),
    Download(Century, PathBuf),
}

impl PortalAction {
    /// Log-safe name; never includes entered codes.
    pub fn name(&self) -> String {
        match self {
            PortalAction::Login => "login".to_string(),
            PortalAction::CaptureTitle(c) => format!("capture_title:{}", c),
            PortalAction::EnterCode(c, _) => format!("enter_code:{}", c),
            PortalAction::Download(c, _) => format!("download:{}", c),
        }
    }
}

/// Record of an executed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    /// Directory where manuscripts are saved
    pub downloads_dir: PathBuf,
    /// Directory for browser storage state between actions
    pub state_dir: PathBuf,
    /// `node_modules` containing `playwright`, exported as `NODE_PATH`
    pub node_modules: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            downloads_dir: PathBuf::from("downloads"),
            state_dir: PathBuf::from("test-results/state"),
            node_modules: None,
        }
    }
}

/// JavaScript string literal for an arbitrary value.
fn js(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Turns portal actions into Playwright scripts.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    browser: Browser,
    headless: bool,
    portal: PortalSpec,
    selectors: Selectors,
    timeouts: Timeouts,
    viewport: Viewport,
    state_path: PathBuf,
}

impl ScriptBuilder {
    pub fn new(config: &PlaywrightConfig, spec: &ScenarioSpec) -> Self {
        Self {
            browser: spec.browser.unwrap_or(config.browser),
            headless: spec.headless.unwrap_or(config.headless),
            portal: spec.portal.clone(),
            selectors: spec.selectors.clone(),
            timeouts: spec.timeouts.clone(),
            viewport: spec.viewport.clone(),
            state_path: config.state_dir.join(format!("{}-storage-state.json", spec.name)),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Build the complete script for one action
    pub fn build(&self, action: &PortalAction) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const fs = require('fs');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const statePath = {state_path};
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }},
    acceptDownloads: true,
    storageState: fs.existsSync(statePath) ? statePath : undefined,
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({element_ms});
  page.setDefaultNavigationTimeout({navigation_ms});
  let value = null;

  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            state_path = js(&self.state_path.to_string_lossy()),
            width = self.viewport.width,
            height = self.viewport.height,
            element_ms = self.timeouts.element_ms,
            navigation_ms = self.timeouts.navigation_ms,
        ));

        script.push_str(&format!("    // {}\n", action.name()));
        script.push_str(&self.action_to_js(action));

        script.push_str(
            r#"
    await context.storageState({ path: statePath });
    console.log(JSON.stringify({ success: true, value }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    fn open_card(&self, century: Century) -> String {
        format!(
            r#"    await page.goto({portal}, {{ waitUntil: 'domcontentloaded' }});
    const card = page.locator({card}).filter({{ hasText: {label} }}).first();
    await card.scrollIntoViewIfNeeded();
"#,
            portal = js(&self.portal.portal_url),
            card = js(&self.selectors.manuscript_card),
            label = js(&self.selectors.label_for(century)),
        )
    }

    fn action_to_js(&self, action: &PortalAction) -> String {
        match action {
            PortalAction::Login => format!(
                r#"    await page.goto({login}, {{ waitUntil: 'networkidle' }});
    await page.fill({email_input}, process.env.{env_email});
    await page.fill({password_input}, process.env.{env_password});
    await Promise.all([
      page.waitForURL(url => !url.toString().includes('/login')),
      page.click({submit}),
    ]);
"#,
                login = js(&self.portal.login_url),
                email_input = js(&self.selectors.email_input),
                password_input = js(&self.selectors.password_input),
                submit = js(&self.selectors.submit_button),
                env_email = ENV_EMAIL,
                env_password = ENV_PASSWORD,
            ),
            PortalAction::CaptureTitle(century) => format!(
                r#"{open}    const heading = card.locator({title}).first();
    if ((await heading.count()) > 0) {{
      value = ((await heading.textContent()) || '').trim();
    }}
"#,
                open = self.open_card(*century),
                title = js(&self.selectors.title),
            ),
            PortalAction::EnterCode(century, code) => format!(
                r#"{open}    const input = card.locator({input}).first();
    await input.fill('');
    await input.fill({code});
    await card.locator({unlock}).first().click();
    await page.waitForTimeout(500);
    const dismiss = page.locator({dismiss}).first();
    if (await dismiss.isVisible().catch(() => false)) {{
      await dismiss.click();
    }}
"#,
                open = self.open_card(*century),
                input = js(&self.selectors.code_input),
                code = js(code),
                unlock = js(&self.selectors.unlock_button),
                dismiss = js(&self.selectors.dismiss_button),
            ),
            PortalAction::Download(century, path) => format!(
                r#"{open}    const [download] = await Promise.all([
      page.waitForEvent('download', {{ timeout: {timeout} }}),
      card.locator({button}).first().click(),
    ]);
    await download.saveAs({path});
    value = {path};
"#,
                open = self.open_card(*century),
                timeout = self.timeouts.download_ms,
                button = js(&self.selectors.download_button),
                path = js(&path.to_string_lossy()),
            ),
        }
    }
}

/// Output line printed by every script on success
#[derive(Debug, Deserialize)]
struct ScriptOutput {
    success: bool,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_output(stdout: &str) -> E2eResult<Option<serde_json::Value>> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| E2eError::Playwright("script printed no result".into()))?;
    let output: ScriptOutput = serde_json::from_str(line)?;
    if !output.success {
        return Err(E2eError::Playwright(output.error.unwrap_or_else(|| "unknown failure".into())));
    }
    Ok(output.value.filter(|v| !v.is_null()))
}

/// Playwright-backed [`PortalDriver`]
pub struct PlaywrightDriver {
    builder: ScriptBuilder,
    portal: PortalSpec,
    downloads_dir: PathBuf,
    node_modules: Option<PathBuf>,
    actions: Vec<ActionRecord>,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig, spec: &ScenarioSpec) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.downloads_dir)?;
        std::fs::create_dir_all(&config.state_dir)?;

        let builder = ScriptBuilder::new(&config, spec);
        // Every run starts from a fresh login.
        if builder.state_path().exists() {
            std::fs::remove_file(builder.state_path())?;
        }

        Ok(Self {
            builder,
            portal: spec.portal.clone(),
            downloads_dir: config.downloads_dir,
            node_modules: config.node_modules,
            actions: Vec::new(),
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    /// Execute the script via node, returning the script's `value`
    async fn run_script(&self, script: &str, env: &[(&str, String)]) -> E2eResult<Option<serde_json::Value>> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("action.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path).current_dir(temp_dir.path());
        if let Some(modules) = &self.node_modules {
            cmd.env("NODE_PATH", modules);
        }
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match parse_output(&stderr) {
                Err(E2eError::Playwright(message)) => message,
                _ => stderr.trim().to_string(),
            };
            return Err(E2eError::Playwright(reason));
        }

        parse_output(&stdout)
    }

    async fn execute(&mut self, action: PortalAction) -> E2eResult<Option<serde_json::Value>> {
        let start = Instant::now();
        let name = action.name();
        debug!("Executing portal action: {}", name);

        let env = match &action {
            PortalAction::Login => vec![
                (ENV_EMAIL, self.portal.email()?),
                (ENV_PASSWORD, self.portal.password()?),
            ],
            _ => Vec::new(),
        };

        let script = self.builder.build(&action);
        let result = self.run_script(&script, &env).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.actions.push(ActionRecord {
            action: name.clone(),
            success: result.is_ok(),
            duration_ms,
            error: result.as_ref().err().map(|e| e.to_string()),
        });

        result.map_err(|e| E2eError::ActionFailed {
            action: name,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PortalDriver for PlaywrightDriver {
    async fn login(&mut self) -> scriptorium_core::Result<()> {
        info!(url = %self.portal.login_url, "logging in");
        self.execute(PortalAction::Login).await?;
        Ok(())
    }

    async fn capture_title(&mut self, century: Century) -> scriptorium_core::Result<Option<String>> {
        match self.execute(PortalAction::CaptureTitle(century)).await {
            Ok(value) => Ok(value
                .as_ref()
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)),
            Err(e) => {
                // A missing title is recoverable: the chain falls back to default titles.
                warn!(%century, "could not capture title: {}", e);
                Ok(None)
            }
        }
    }

    async fn enter_code(&mut self, century: Century, code: &str) -> scriptorium_core::Result<()> {
        self.execute(PortalAction::EnterCode(century, code.to_string())).await?;
        Ok(())
    }

    async fn download_manuscript(&mut self, century: Century) -> scriptorium_core::Result<PathBuf> {
        let path = self.downloads_dir.join(format!("siglo-{}.pdf", century));
        self.execute(PortalAction::Download(century, path.clone())).await?;
        if !path.exists() {
            return Err(E2eError::ActionFailed {
                action: format!("download:{}", century),
                reason: format!("{} was not written", path.display()),
            }
            .into());
        }
        info!(%century, path = %path.display(), "manuscript downloaded");
        Ok(path)
    }
}
