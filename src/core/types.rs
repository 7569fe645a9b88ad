//! Core data types shared by the store, the aggregator and the binner
//!
//! Records come out of a `RecordSource` as `UsageRecord`s; everything derived
//! from them (`AppGroup`, `MonthlyUsage`) is recomputed on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::fiscal::{FiscalMonth, placeholder_series};

/// Execution outcome of a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RunStatus {
    /// Created at invocation start, not finished yet
    Submitted,
    Success,
    Failure,
}

impl RunStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RunStatus::Submitted => "submitted",
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Submitted)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" | "pending" => Ok(RunStatus::Submitted),
            "success" | "succeeded" => Ok(RunStatus::Success),
            "failure" | "failed" | "error" => Ok(RunStatus::Failure),
            other => Err(other.to_string()),
        }
    }
}

/// One row of the raw event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UsageRecord {
    pub(crate) id: i64,
    pub(crate) app_name: String,
    pub(crate) endpoint: String,
    /// Duration with unit suffix ("1.5s"); unset until the run completes
    #[serde(default)]
    pub(crate) elapsed_time: Option<String>,
    pub(crate) status: RunStatus,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) task_id: String,
}

impl UsageRecord {
    pub(crate) fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Count for a single fiscal month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct MonthlyUsage {
    pub(crate) month: FiscalMonth,
    pub(crate) count: u64,
}

/// Per-application aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AppGroup {
    pub(crate) app_name: String,
    pub(crate) endpoint: String,
    pub(crate) count: u64,
    pub(crate) min_time: String,
    pub(crate) max_time: String,
    pub(crate) avg_time: String,
    pub(crate) total_time: String,
    /// Records whose elapsed time could not be parsed and were counted as 0s
    pub(crate) invalid_elapsed: u64,
    /// Twelve entries in fiscal order once binned, empty before that
    pub(crate) monthly_usage: Vec<MonthlyUsage>,
}

impl AppGroup {
    /// Monthly series, or an all-zero one when nothing has been binned yet
    pub(crate) fn monthly_or_placeholder(&self) -> Vec<MonthlyUsage> {
        if self.monthly_usage.is_empty() {
            placeholder_series()
        } else {
            self.monthly_usage.clone()
        }
    }
}

/// Which slice of the record set a report covers
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportScope {
    /// Calendar year of `created_at`; `None` means all years combined
    pub(crate) year: Option<i32>,
    /// Restrict the report to a single application
    pub(crate) app: Option<String>,
}

impl ReportScope {
    pub(crate) fn new(year: Option<i32>, app: Option<String>) -> Self {
        Self { year, app }
    }
}
