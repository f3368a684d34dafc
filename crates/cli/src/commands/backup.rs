//! Backup Command

use clap::Args;
use serde::Serialize;

use scriptorium_core::Century;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct BackupArgs {
    /// Show only this century
    #[arg(short, long)]
    pub century: Option<Century>,
}

#[derive(Serialize)]
pub struct BackupDisplay {
    pub century: Century,
    pub code: &'static str,
    pub title: Option<&'static str>,
}

impl TableDisplay for BackupDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Century", "Backup Code", "Default Title"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.century.to_string(),
            self.code.to_string(),
            self.title.unwrap_or("-").to_string(),
        ]
    }
}

pub fn execute(args: &BackupArgs, format: OutputFormat) {
    let rows: Vec<BackupDisplay> = Century::ALL
        .iter()
        .copied()
        .filter(|c| args.century.map_or(true, |only| only == *c))
        .map(|century| BackupDisplay {
            century,
            code: century.backup_code(),
            title: century.default_title(),
        })
        .collect();
    print_list(&rows, format);
}
