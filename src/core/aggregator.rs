//! Group-by over usage records
//!
//! Reduces a flat record list into one `AppGroup` per application name,
//! enforcing that every record of an app hit the same endpoint.

use std::collections::HashMap;

use crate::core::duration::{format_average, format_elapsed, parse_elapsed};
use crate::core::types::{AppGroup, UsageRecord};
use crate::error::AppError;

/// Running totals for one application
#[derive(Debug)]
struct GroupAccumulator {
    app_name: String,
    endpoint: String,
    count: u64,
    total: f64,
    min: f64,
    max: f64,
    invalid_elapsed: u64,
}

impl GroupAccumulator {
    fn new(record: &UsageRecord) -> Self {
        Self {
            app_name: record.app_name.clone(),
            endpoint: record.endpoint.clone(),
            count: 0,
            total: 0.0,
            min: f64::INFINITY,
            max: 0.0,
            invalid_elapsed: 0,
        }
    }

    fn add(&mut self, record: &UsageRecord) -> Result<(), AppError> {
        if record.endpoint != self.endpoint {
            return Err(AppError::InconsistentEndpoint {
                app_name: self.app_name.clone(),
            });
        }

        let seconds = match record.elapsed_time.as_deref().and_then(parse_elapsed) {
            Some(s) => s,
            None => {
                tracing::warn!(
                    app = %record.app_name,
                    id = record.id,
                    elapsed = ?record.elapsed_time,
                    "unparseable elapsed time, counting as 0s"
                );
                self.invalid_elapsed += 1;
                0.0
            }
        };

        self.count += 1;
        self.total += seconds;
        self.min = self.min.min(seconds);
        self.max = self.max.max(seconds);
        Ok(())
    }

    fn into_group(self) -> AppGroup {
        // count >= 1 for every accumulator that exists
        let avg = self.total / self.count as f64;
        AppGroup {
            app_name: self.app_name,
            endpoint: self.endpoint,
            count: self.count,
            min_time: format_elapsed(self.min),
            max_time: format_elapsed(self.max),
            avg_time: format_average(avg),
            total_time: format_elapsed(self.total),
            invalid_elapsed: self.invalid_elapsed,
            monthly_usage: Vec::new(),
        }
    }
}

/// Aggregate successful records by `app_name`.
///
/// Groups come back in first-seen order. Any app whose records disagree on
/// the endpoint fails the whole call.
pub(crate) fn aggregate(records: &[UsageRecord]) -> Result<Vec<AppGroup>, AppError> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        if !record.is_success() {
            skipped += 1;
            continue;
        }
        let slot = *index.entry(record.app_name.as_str()).or_insert_with(|| {
            groups.push(GroupAccumulator::new(record));
            groups.len() - 1
        });
        groups[slot].add(record)?;
    }

    if skipped > 0 {
        tracing::debug!(skipped, "ignored records without a success status");
    }

    Ok(groups.into_iter().map(GroupAccumulator::into_group).collect())
}

/// Fail on the first app whose successful records disagree on the endpoint.
///
/// Runs over the whole record set, so a narrower report scope cannot hide a
/// conflict that lives outside it.
pub(crate) fn check_endpoints(records: &[UsageRecord]) -> Result<(), AppError> {
    let mut canonical: HashMap<&str, &str> = HashMap::new();
    for record in records.iter().filter(|r| r.is_success()) {
        let endpoint = *canonical
            .entry(record.app_name.as_str())
            .or_insert(record.endpoint.as_str());
        if endpoint != record.endpoint {
            return Err(AppError::InconsistentEndpoint {
                app_name: record.app_name.clone(),
            });
        }
    }
    Ok(())
}
