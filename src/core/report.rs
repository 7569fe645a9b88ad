//! Aggregate + bin in one pass over a shared scope

use crate::core::aggregator::{aggregate, check_endpoints};
use crate::core::fiscal::FiscalCalendar;
use crate::core::types::{AppGroup, ReportScope, UsageRecord};
use crate::error::AppError;

/// Build sorted `AppGroup`s with their monthly series filled in.
///
/// Endpoint consistency is checked over every successful record first. The
/// year filter is then applied before aggregation so that each group's
/// `count` equals the sum of its monthly series.
pub(crate) fn build_report(
    records: &[UsageRecord],
    calendar: &FiscalCalendar,
    scope: &ReportScope,
) -> Result<Vec<AppGroup>, AppError> {
    check_endpoints(records)?;

    let scoped: Vec<UsageRecord> = records
        .iter()
        .filter(|r| r.is_success())
        .filter(|r| calendar.in_year(r, scope.year))
        .filter(|r| scope.app.as_deref().is_none_or(|app| r.app_name == app))
        .cloned()
        .collect();

    let mut groups = aggregate(&scoped)?;

    if let Some(app) = scope.app.as_deref()
        && groups.is_empty()
    {
        return Err(AppError::NoAppRecords {
            app_name: app.to_string(),
        });
    }

    for group in &mut groups {
        group.monthly_usage = calendar.bin_monthly(&scoped, &group.app_name, None);
    }
    groups.sort_by(|a, b| a.app_name.cmp(&b.app_name));
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fiscal::{FiscalMonth, total_usage};
    use crate::core::types::RunStatus;
    use chrono::{DateTime, Utc};

    fn rec(app: &str, ts: &str, status: RunStatus) -> UsageRecord {
        UsageRecord {
            id: 0,
            app_name: app.to_string(),
            endpoint: format!("/{app}"),
            elapsed_time: Some("2s".to_string()),
            status,
            created_at: ts.parse::<DateTime<Utc>>().unwrap(),
            task_id: String::new(),
        }
    }

    fn sample() -> Vec<UsageRecord> {
        vec![
            rec("beta", "2024-12-01T10:00:00Z", RunStatus::Success),
            rec("beta", "2025-01-01T10:00:00Z", RunStatus::Success),
            rec("alpha", "2025-02-01T10:00:00Z", RunStatus::Success),
            rec("alpha", "2025-02-03T10:00:00Z", RunStatus::Failure),
            rec("alpha", "2025-12-24T10:00:00Z", RunStatus::Success),
            rec("beta", "2025-06-01T10:00:00Z", RunStatus::Success),
        ]
    }

    #[test]
    fn groups_sorted_by_name() {
        let groups = build_report(&sample(), &FiscalCalendar::default(), &ReportScope::default()).unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.app_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn monthly_series_sums_to_count() {
        let cal = FiscalCalendar::default();
        for year in [None, Some(2024), Some(2025)] {
            let groups = build_report(&sample(), &cal, &ReportScope::new(year, None)).unwrap();
            for g in &groups {
                assert_eq!(g.monthly_usage.len(), 12);
                assert_eq!(total_usage(&g.monthly_usage), g.count, "{} {:?}", g.app_name, year);
            }
        }
    }

    #[test]
    fn year_scope_restricts_counts() {
        let groups = build_report(
            &sample(),
            &FiscalCalendar::default(),
            &ReportScope::new(Some(2024), None),
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].app_name, "beta");
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].monthly_usage[FiscalMonth::December.fiscal_index()].count, 1);
    }

    #[test]
    fn year_without_records_is_empty_not_error() {
        let groups = build_report(
            &sample(),
            &FiscalCalendar::default(),
            &ReportScope::new(Some(1990), None),
        )
        .unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn app_scope_returns_single_group() {
        let groups = build_report(
            &sample(),
            &FiscalCalendar::default(),
            &ReportScope::new(None, Some("alpha".into())),
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
    }

    #[test]
    fn unknown_app_is_an_error() {
        let err = build_report(
            &sample(),
            &FiscalCalendar::default(),
            &ReportScope::new(None, Some("gamma".into())),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NoAppRecords { ref app_name } if app_name == "gamma"));
    }

    #[test]
    fn endpoint_conflict_outside_year_still_fails() {
        let mut old = rec("app1", "2024-06-01T10:00:00Z", RunStatus::Success);
        old.endpoint = "/e1".into();
        let mut new = rec("app1", "2025-06-01T10:00:00Z", RunStatus::Success);
        new.endpoint = "/e2".into();
        let records = vec![old, new];
        let cal = FiscalCalendar::default();

        for scope in [
            ReportScope::default(),
            ReportScope::new(Some(2025), None),
            ReportScope::new(Some(2024), Some("app1".into())),
        ] {
            let err = build_report(&records, &cal, &scope).unwrap_err();
            assert!(matches!(err, AppError::InconsistentEndpoint { ref app_name } if app_name == "app1"));
        }
    }

    #[test]
    fn failed_only_app_is_an_error() {
        let records = vec![rec("omega", "2025-01-01T10:00:00Z", RunStatus::Failure)];
        let err = build_report(
            &records,
            &FiscalCalendar::default(),
            &ReportScope::new(None, Some("omega".into())),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NoAppRecords { .. }));
    }
}
