//! Challenge Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use scriptorium_core::{Century, ChallengeClient, ScriptoriumConfig};

use crate::output::{print_info, print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ChallengeArgs {
    /// Century whose manuscript is being unlocked
    #[arg(short, long)]
    pub century: Century,

    /// Unlock code of the previous century
    #[arg(short = 'u', long)]
    pub unlock_code: String,

    /// Manuscript title; defaults to the known title for the century
    #[arg(short, long)]
    pub title: Option<String>,

    /// Use configured fallback passwords when the API fails
    #[arg(long)]
    pub allow_fallback_codes: bool,
}

#[derive(Serialize)]
pub struct PasswordDisplay {
    pub century: Century,
    pub book_title: String,
    pub password: String,
}

impl TableDisplay for PasswordDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Century", "Book", "Password"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.century.to_string(), self.book_title.clone(), self.password.clone()]
    }
}

pub async fn execute(args: &ChallengeArgs, config: &ScriptoriumConfig, format: OutputFormat) -> Result<()> {
    let title = match (&args.title, args.century.default_title()) {
        (Some(title), _) => title.clone(),
        (None, Some(default)) => default.to_string(),
        (None, None) => anyhow::bail!("--title is required for century {}", args.century),
    };

    let mut api = config.api.clone();
    api.allow_fallback_codes |= args.allow_fallback_codes;

    let client = ChallengeClient::new(&api)?;
    debug!(url = client.url(), "requesting challenge");
    print_info(&format!("Requesting challenge for \"{}\"", title));

    let password = client
        .unlock_password(&title, &args.unlock_code, args.century.as_str())
        .await?;

    print_item(
        &PasswordDisplay {
            century: args.century,
            book_title: title,
            password,
        },
        format,
    );
    Ok(())
}
