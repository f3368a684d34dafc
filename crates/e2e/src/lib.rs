//! Scriptorium portal automation
//!
//! Drives the manuscript portal with Playwright and feeds each downloaded
//! manuscript through the core unlock chain:
//! - Probes the portal before launching a browser
//! - Runs one Node script per portal action, sharing the login session
//! - Parses declarative YAML scenarios (portal URLs, selectors, centuries)
//! - Writes per-scenario results with codes, stage outcomes and action logs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  wait_until_reachable(login_url)                            │
//! │  PlaywrightDriver: PortalDriver                             │
//! │    ├── login()                                              │
//! │    ├── capture_title(century)                               │
//! │    ├── enter_code(century, code)                            │
//! │    └── download_manuscript(century) -> siglo-XIV.pdf        │
//! │  UnlockChain (scriptorium-core)                             │
//! │    ├── XIV..XVI  download, extract, carry code forward      │
//! │    └── XVII..XVIII  cipher challenge, then download         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod playwright;
pub mod probe;
pub mod runner;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightConfig, PlaywrightDriver};
pub use runner::{RunnerConfig, ScenarioRunner};
pub use spec::ScenarioSpec;
