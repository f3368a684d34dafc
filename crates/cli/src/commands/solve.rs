//! Solve Command
//!
//! Offline solver: reads a challenge object, or a full API response
//! envelope, and prints the password.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

use scriptorium_core::{solve, ChallengePayload};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct SolveArgs {
    /// Challenge JSON file; reads stdin when omitted or `-`
    pub input: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct SolutionDisplay {
    pub book_title: String,
    pub targets: usize,
    pub password: String,
}

impl TableDisplay for SolutionDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Book", "Targets", "Password"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.book_title.clone(), self.targets.to_string(), self.password.clone()]
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Accept either `{vault, targets}` or `{success, challenge: {...}}`.
pub fn parse_challenge(json: &str) -> Result<ChallengePayload> {
    let value: Value = serde_json::from_str(json).context("challenge is not valid JSON")?;
    let challenge = match value {
        Value::Object(mut obj) if obj.contains_key("challenge") => obj
            .remove("challenge")
            .unwrap_or(Value::Null),
        other => other,
    };
    Ok(ChallengePayload::from_value(challenge)?)
}

pub fn execute(args: &SolveArgs, format: OutputFormat) -> Result<()> {
    let payload = parse_challenge(&read_input(args.input.as_ref())?)?;
    let password = solve(&payload)?;

    print_item(
        &SolutionDisplay {
            book_title: payload.book_title,
            targets: payload.targets.len(),
            password,
        },
        format,
    );
    Ok(())
}
