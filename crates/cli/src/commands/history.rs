//! History Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use scriptorium_core::{Century, CodeHistory, ScriptoriumConfig};

use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List recorded codes
    List {
        /// Only this century
        #[arg(short, long)]
        century: Option<Century>,
    },

    /// Forget recorded codes
    Clear {
        /// Only this century; all centuries when omitted
        #[arg(short, long)]
        century: Option<Century>,
    },
}

/// One recorded code
#[derive(Serialize)]
pub struct HistoryEntry {
    pub century: String,
    pub position: usize,
    pub code: String,
}

impl TableDisplay for HistoryEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Century", "#", "Code"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.century.clone(), self.position.to_string(), self.code.clone()]
    }
}

fn entries(history: &CodeHistory, only: Option<Century>) -> Vec<HistoryEntry> {
    history
        .entries()
        .iter()
        .filter(|(century, _)| only.map_or(true, |c| c.as_str() == century.as_str()))
        .flat_map(|(century, codes)| {
            codes.iter().enumerate().map(move |(i, code)| HistoryEntry {
                century: century.clone(),
                position: i + 1,
                code: code.clone(),
            })
        })
        .collect()
}

pub fn execute(cmd: &HistoryCommands, config: &ScriptoriumConfig, format: OutputFormat) -> Result<()> {
    let mut history = CodeHistory::open(&config.paths.history_file);

    match cmd {
        HistoryCommands::List { century } => {
            print_list(&entries(&history, *century), format);
        }

        HistoryCommands::Clear { century } => {
            history.clear(century.map(|c| c.as_str()))?;
            match century {
                Some(c) => print_success(&format!("Cleared history for {}", c)),
                None => print_success("Cleared code history"),
            }
        }
    }

    Ok(())
}
