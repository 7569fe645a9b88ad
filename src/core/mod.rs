//! Core module - record model, aggregation and fiscal binning
//!
//! Everything here is a pure function over records that were already fetched.

mod aggregator;
mod duration;
mod fiscal;
mod report;
mod types;

pub(crate) use duration::parse_elapsed;
pub(crate) use fiscal::{FISCAL_MONTHS, FiscalCalendar, total_usage};
pub(crate) use report::build_report;
pub(crate) use types::{AppGroup, MonthlyUsage, ReportScope, RunStatus, UsageRecord};
