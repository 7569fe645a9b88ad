//! CLI subcommand definitions

use std::path::PathBuf;

use clap::Subcommand;

use crate::core::RunStatus;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Per-app totals with min/max/avg elapsed time (default)
    Summary,
    /// Fiscal-month counts (December first) for one app
    Monthly {
        /// Application name
        app: String,
    },
    /// Record the start of a tool run and print its id
    Start {
        #[arg(long)]
        app: String,
        #[arg(long)]
        endpoint: String,
        /// Correlates this record with its later `finish`
        #[arg(long)]
        task_id: String,
    },
    /// Record the outcome of a run created by `start`
    Finish {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        task_id: String,
        #[arg(long, value_parser = parse_status)]
        status: RunStatus,
        /// Elapsed time, e.g. "1.5s"
        #[arg(long)]
        elapsed: String,
    },
    /// Import finished records from a JSON array
    Import {
        file: PathBuf,
    },
    /// List the fiscal months in reporting order
    Months,
}

fn parse_status(s: &str) -> Result<RunStatus, String> {
    match s.parse::<RunStatus>() {
        Ok(RunStatus::Submitted) => Err("a finished run must be success or failure".to_string()),
        Ok(status) => Ok(status),
        Err(other) => Err(format!("unknown status \"{other}\" (expected success or failure)")),
    }
}
