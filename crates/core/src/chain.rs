//! Unlock chain: drives every century in chronological order
//!
//! Captured titles and codes live in an [`UnlockContext`] that is passed
//! explicitly through each stage. The browser side sits behind
//! [`PortalDriver`], the challenge backend behind [`ChallengeSource`].

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info};

use crate::api::ChallengeClient;
use crate::century::Century;
use crate::error::{Error, Result};
use crate::orchestrator::{CodeOrchestrator, CodeSource};

/// Browser-side operations the chain needs from the portal.
#[async_trait]
pub trait PortalDriver: Send {
    async fn login(&mut self) -> Result<()>;

    /// Title shown on the manuscript card, when it can be read.
    async fn capture_title(&mut self, century: Century) -> Result<Option<String>>;

    /// Type a code or password into the manuscript's unlock form and submit it.
    async fn enter_code(&mut self, century: Century, code: &str) -> Result<()>;

    /// Download the manuscript PDF and return where it was saved.
    async fn download_manuscript(&mut self, century: Century) -> Result<PathBuf>;
}

/// Produces the unlock password for a challenge-guarded manuscript.
#[async_trait]
pub trait ChallengeSource: Send + Sync {
    async fn unlock_password(&self, book_title: &str, unlock_code: &str, century: Century) -> Result<String>;
}

#[async_trait]
impl ChallengeSource for ChallengeClient {
    async fn unlock_password(&self, book_title: &str, unlock_code: &str, century: Century) -> Result<String> {
        ChallengeClient::unlock_password(self, book_title, unlock_code, century.as_str()).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Enter the previous code (if any), then download and extract.
    Download,
    /// Solve the guardian's cipher challenge, enter the password, then download and extract.
    Challenge,
}

impl StageKind {
    pub fn for_century(century: Century) -> Self {
        match century {
            Century::XIV | Century::XV | Century::XVI => StageKind::Download,
            Century::XVII | Century::XVIII => StageKind::Challenge,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub century: Century,
    pub kind: StageKind,
    pub title: Option<String>,
    pub code: Option<String>,
    pub source: Option<CodeSource>,
    pub error: Option<String>,
}

/// Per-run state threaded through every stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnlockContext {
    pub titles: BTreeMap<Century, String>,
    pub codes: BTreeMap<Century, String>,
    pub outcomes: Vec<StageOutcome>,
}

impl UnlockContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a code, e.g. when resuming a chain part-way through.
    pub fn seed_code(&mut self, century: Century, code: impl Into<String>) {
        self.codes.insert(century, code.into());
    }

    pub fn code(&self, century: Century) -> Option<&str> {
        self.codes.get(&century).map(String::as_str)
    }

    pub fn title(&self, century: Century) -> Option<&str> {
        self.titles.get(&century).map(String::as_str)
    }

    fn prerequisite(&self, century: Century) -> Result<Option<String>> {
        match century.previous() {
            None => Ok(None),
            Some(prev) => self
                .code(prev)
                .map(|c| Some(c.to_string()))
                .ok_or_else(|| Error::MissingPrerequisite {
                    century: century.to_string(),
                    needs: prev.to_string(),
                }),
        }
    }
}

pub struct UnlockChain {
    orchestrator: CodeOrchestrator,
    challenges: Box<dyn ChallengeSource>,
    centuries: Vec<Century>,
}

impl UnlockChain {
    pub fn new(orchestrator: CodeOrchestrator, challenges: Box<dyn ChallengeSource>) -> Self {
        Self {
            orchestrator,
            challenges,
            centuries: Century::ALL.to_vec(),
        }
    }

    /// Restrict the run to a subset; stages still execute chronologically.
    pub fn with_centuries(mut self, mut centuries: Vec<Century>) -> Self {
        centuries.sort();
        centuries.dedup();
        self.centuries = centuries;
        self
    }

    pub fn centuries(&self) -> &[Century] {
        &self.centuries
    }

    pub fn orchestrator(&self) -> &CodeOrchestrator {
        &self.orchestrator
    }

    /// Log in, then unlock each century in turn. Stops at the first failed stage.
    pub async fn run(&mut self, driver: &mut dyn PortalDriver, ctx: &mut UnlockContext) -> Result<()> {
        driver.login().await?;
        info!(centuries = self.centuries.len(), "logged in; starting unlock chain");

        for century in self.centuries.clone() {
            let kind = StageKind::for_century(century);
            match self.run_stage(driver, ctx, century, kind).await {
                Ok(()) => {}
                Err(e) => {
                    error!(%century, "stage failed: {}", e);
                    ctx.outcomes.push(StageOutcome {
                        century,
                        kind,
                        title: ctx.title(century).map(String::from),
                        code: None,
                        source: None,
                        error: Some(e.to_string()),
                    });
                    return Err(e);
                }
            }
        }

        info!("unlock chain complete");
        Ok(())
    }

    async fn run_stage(
        &mut self,
        driver: &mut dyn PortalDriver,
        ctx: &mut UnlockContext,
        century: Century,
        kind: StageKind,
    ) -> Result<()> {
        info!(%century, ?kind, "processing manuscript");

        if let Some(title) = driver.capture_title(century).await? {
            ctx.titles.insert(century, title);
        }
        let previous_code = ctx.prerequisite(century)?;

        match kind {
            StageKind::Download => {
                if let Some(code) = &previous_code {
                    driver.enter_code(century, code).await?;
                }
            }
            StageKind::Challenge => {
                let title = ctx
                    .title(century)
                    .or_else(|| century.default_title())
                    .ok_or_else(|| Error::Driver(format!("no manuscript title for century {}", century)))?
                    .to_string();
                let unlock_code = previous_code.unwrap_or_default();
                let password = self
                    .challenges
                    .unlock_password(&title, &unlock_code, century)
                    .await?;
                driver.enter_code(century, &password).await?;
            }
        }

        let path = driver.download_manuscript(century).await?;
        let outcome = self.orchestrator.extract_code_detailed(&path, century.as_str());
        info!(%century, code = %outcome.code, source = %outcome.source, "stage complete");

        ctx.codes.insert(century, outcome.code.clone());
        ctx.outcomes.push(StageOutcome {
            century,
            kind,
            title: ctx.title(century).map(String::from),
            code: Some(outcome.code),
            source: Some(outcome.source),
            error: None,
        });
        Ok(())
    }
}
