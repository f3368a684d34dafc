//! Scenario runner: probes the portal, drives the browser, runs the unlock chain

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use scriptorium_core::{
    Century, ChallengeClient, CodeOrchestrator, PortalDriver, ScriptoriumConfig, StageOutcome,
    UnlockChain, UnlockContext,
};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{ActionRecord, PlaywrightConfig, PlaywrightDriver};
use crate::probe::wait_until_reachable;
use crate::spec::ScenarioSpec;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub codes: BTreeMap<Century, String>,
    pub stages: Vec<StageOutcome>,
    pub actions: Vec<ActionRecord>,
    pub error: Option<String>,
}

impl ScenarioResult {
    fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            codes: BTreeMap::new(),
            stages: Vec::new(),
            actions: Vec::new(),
            error: Some(error),
        }
    }
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub scriptorium: ScriptoriumConfig,
    pub playwright: PlaywrightConfig,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Skip the reachability probe before launching the browser
    pub skip_probe: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let scriptorium = ScriptoriumConfig::default();
        let playwright = PlaywrightConfig {
            downloads_dir: scriptorium.paths.downloads_dir.clone(),
            ..Default::default()
        };
        Self {
            scriptorium,
            playwright,
            scenarios_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            skip_probe: false,
        }
    }
}

pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run all scenarios in the scenarios directory
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<ScenarioResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        Ok(self.run_spec(&spec).await)
    }

    pub async fn run_specs(&self, specs: &[ScenarioSpec]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = self.run_spec(spec).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Scenario results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        SuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario against the live portal with a Playwright browser
    pub async fn run_spec(&self, spec: &ScenarioSpec) -> ScenarioResult {
        if !self.config.skip_probe {
            let timeout = Duration::from_millis(spec.timeouts.reachability_ms);
            if let Err(e) = wait_until_reachable(&spec.portal.login_url, timeout).await {
                return ScenarioResult::failed(&spec.name, e.to_string());
            }
        }

        let mut driver = match PlaywrightDriver::new(self.config.playwright.clone(), spec) {
            Ok(driver) => driver,
            Err(e) => return ScenarioResult::failed(&spec.name, e.to_string()),
        };

        let mut result = self.run_with_driver(spec, &mut driver).await;
        result.actions = driver.actions().to_vec();
        result
    }

    /// Run the unlock chain for `spec` through any portal driver
    pub async fn run_with_driver(&self, spec: &ScenarioSpec, driver: &mut dyn PortalDriver) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let client = match ChallengeClient::new(&self.config.scriptorium.api) {
            Ok(client) => client,
            Err(e) => return ScenarioResult::failed(&spec.name, e.to_string()),
        };
        let orchestrator = CodeOrchestrator::open(&self.config.scriptorium.paths.history_file);
        let mut chain = UnlockChain::new(orchestrator, Box::new(client)).with_centuries(spec.centuries());

        let mut ctx = UnlockContext::new();
        let outcome = chain.run(driver, &mut ctx).await;

        ScenarioResult {
            name: spec.name.clone(),
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            codes: ctx.codes,
            stages: ctx.outcomes,
            actions: Vec::new(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
