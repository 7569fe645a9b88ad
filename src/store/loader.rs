//! Fetch → aggregate → bin, for any record source

use std::time::Instant;

use crate::core::{AppGroup, FiscalCalendar, ReportScope, build_report};
use crate::error::AppError;
use crate::store::RecordSource;

/// Report plus the numbers shown in the summary line
#[derive(Debug, Default)]
pub(crate) struct LoadResult {
    pub(crate) groups: Vec<AppGroup>,
    /// Successful records returned by the source, before scoping
    pub(crate) fetched: usize,
    /// Processing time in milliseconds
    pub(crate) elapsed_ms: f64,
}

impl LoadResult {
    /// Records that made it into the report after year/app scoping
    pub(crate) fn in_scope(&self) -> u64 {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub(crate) fn invalid_elapsed(&self) -> u64 {
        self.groups.iter().map(|g| g.invalid_elapsed).sum()
    }
}

pub(crate) fn load_report(
    source: &dyn RecordSource,
    calendar: &FiscalCalendar,
    scope: &ReportScope,
) -> Result<LoadResult, AppError> {
    let start = Instant::now();
    let records = source.fetch_successful()?.ok_or(AppError::NoRecords)?;
    tracing::debug!(
        source = source.name(),
        records = records.len(),
        fetch_ms = start.elapsed().as_secs_f64() * 1000.0,
        "fetched successful records"
    );

    let groups = build_report(&records, calendar, scope)?;
    let result = LoadResult {
        groups,
        fetched: records.len(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    let invalid = result.invalid_elapsed();
    if invalid > 0 && result.groups.iter().all(|g| g.total_time == "0s") {
        tracing::warn!(invalid, "every elapsed time is zero; check the source data");
    }
    Ok(result)
}
