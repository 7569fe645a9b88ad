//! Fiscal calendar: twelve monthly buckets for a year that starts in December

use chrono::Datelike;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::types::{MonthlyUsage, UsageRecord};
use crate::utils::Timezone;

/// Calendar month names, index 0 = January
const CALENDAR_MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Months in fiscal order. Discriminant == fiscal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub(crate) enum FiscalMonth {
    December = 0,
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
}

pub(crate) const FISCAL_MONTHS: [FiscalMonth; 12] = [
    FiscalMonth::December,
    FiscalMonth::January,
    FiscalMonth::February,
    FiscalMonth::March,
    FiscalMonth::April,
    FiscalMonth::May,
    FiscalMonth::June,
    FiscalMonth::July,
    FiscalMonth::August,
    FiscalMonth::September,
    FiscalMonth::October,
    FiscalMonth::November,
];

impl FiscalMonth {
    /// Position in the fiscal year, 0 = December
    pub(crate) fn fiscal_index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_fiscal_index(index: usize) -> Option<Self> {
        FISCAL_MONTHS.get(index).copied()
    }

    /// Map a calendar month (0 = January) onto the fiscal year
    pub(crate) fn from_calendar_index(calendar_index: usize) -> Option<Self> {
        if calendar_index >= 12 {
            return None;
        }
        Self::from_fiscal_index((calendar_index + 1) % 12)
    }

    /// Calendar month index, 0 = January
    pub(crate) fn calendar_index(self) -> usize {
        (self.fiscal_index() + 11) % 12
    }

    pub(crate) fn name(self) -> &'static str {
        month_name(self.calendar_index()).unwrap_or_default()
    }

    pub(crate) fn short_name(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for FiscalMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FiscalMonth {
    type Err = String;

    /// Accepts full or three-letter month names, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FISCAL_MONTHS
            .iter()
            .copied()
            .find(|m| {
                let name = m.name().to_ascii_lowercase();
                name == wanted || (wanted.len() == 3 && name.starts_with(&wanted))
            })
            .ok_or_else(|| s.to_string())
    }
}

/// Display name for a calendar month index (0 = January)
pub(crate) fn month_name(calendar_index: usize) -> Option<&'static str> {
    CALENDAR_MONTH_NAMES.get(calendar_index).copied()
}

/// Twelve zero-count entries in fiscal order
pub(crate) fn placeholder_series() -> Vec<MonthlyUsage> {
    FISCAL_MONTHS
        .iter()
        .map(|&month| MonthlyUsage { month, count: 0 })
        .collect()
}

/// Sum of a monthly series
pub(crate) fn total_usage(series: &[MonthlyUsage]) -> u64 {
    series.iter().map(|m| m.count).sum()
}

/// Buckets record timestamps into fiscal months.
///
/// `created_at` is projected into `timezone` before the calendar month and
/// year are read, so a run at 23:30 UTC on Nov 30 lands in December for a
/// timezone ahead of UTC.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FiscalCalendar {
    timezone: Timezone,
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            timezone: Timezone::utc(),
        }
    }
}

impl FiscalCalendar {
    pub(crate) fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }

    /// Calendar year of a record in this calendar's timezone
    pub(crate) fn record_year(&self, record: &UsageRecord) -> i32 {
        self.timezone.to_fixed_offset(record.created_at).year()
    }

    pub(crate) fn in_year(&self, record: &UsageRecord, year: Option<i32>) -> bool {
        year.is_none_or(|y| self.record_year(record) == y)
    }

    pub(crate) fn fiscal_month(&self, record: &UsageRecord) -> FiscalMonth {
        let local = self.timezone.to_fixed_offset(record.created_at);
        // month0() is always < 12
        FiscalMonth::from_calendar_index(local.month0() as usize).unwrap_or(FiscalMonth::December)
    }

    /// Count `app_name`'s records per fiscal month, optionally for one year.
    ///
    /// Always returns twelve entries, December first.
    pub(crate) fn bin_monthly(
        &self,
        records: &[UsageRecord],
        app_name: &str,
        year: Option<i32>,
    ) -> Vec<MonthlyUsage> {
        let mut series = placeholder_series();
        for record in records {
            if record.app_name != app_name || !self.in_year(record, year) {
                continue;
            }
            series[self.fiscal_month(record).fiscal_index()].count += 1;
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RunStatus;
    use chrono::{DateTime, Utc};

    fn record(app: &str, ts: &str) -> UsageRecord {
        UsageRecord {
            id: 0,
            app_name: app.to_string(),
            endpoint: format!("/{app}"),
            elapsed_time: Some("1s".to_string()),
            status: RunStatus::Success,
            created_at: ts.parse::<DateTime<Utc>>().unwrap(),
            task_id: String::new(),
        }
    }

    #[test]
    fn fiscal_year_starts_in_december() {
        assert_eq!(FISCAL_MONTHS[0], FiscalMonth::December);
        assert_eq!(FISCAL_MONTHS[11], FiscalMonth::November);
    }

    #[test]
    fn fiscal_index_inverts_month_list() {
        for (i, month) in FISCAL_MONTHS.iter().enumerate() {
            assert_eq!(month.fiscal_index(), i);
            assert_eq!(FISCAL_MONTHS[month.fiscal_index()], *month);
            assert_eq!(FiscalMonth::from_fiscal_index(i), Some(*month));
        }
        assert_eq!(FiscalMonth::from_fiscal_index(12), None);
    }

    #[test]
    fn calendar_index_shifts_by_one() {
        assert_eq!(FiscalMonth::from_calendar_index(11), Some(FiscalMonth::December));
        assert_eq!(FiscalMonth::from_calendar_index(0), Some(FiscalMonth::January));
        assert_eq!(FiscalMonth::from_calendar_index(10), Some(FiscalMonth::November));
        assert_eq!(FiscalMonth::from_calendar_index(12), None);
        for i in 0..12 {
            let month = FiscalMonth::from_calendar_index(i).unwrap();
            assert_eq!(month.calendar_index(), i);
            assert_eq!(month_name(i), Some(month.name()));
        }
    }

    #[test]
    fn month_name_uses_calendar_order() {
        assert_eq!(month_name(0), Some("January"));
        assert_eq!(month_name(11), Some("December"));
        assert_eq!(month_name(12), None);
    }

    #[test]
    fn parses_month_names() {
        assert_eq!("december".parse::<FiscalMonth>().unwrap(), FiscalMonth::December);
        assert_eq!("Sep".parse::<FiscalMonth>().unwrap(), FiscalMonth::September);
        assert!("Smarch".parse::<FiscalMonth>().is_err());
        assert_eq!(FiscalMonth::March.short_name(), "Mar");
    }

    #[test]
    fn placeholder_has_twelve_zero_entries() {
        let series = placeholder_series();
        assert_eq!(series.len(), 12);
        for (entry, month) in series.iter().zip(FISCAL_MONTHS) {
            assert_eq!(entry.month, month);
            assert_eq!(entry.count, 0);
        }
    }

    #[test]
    fn bins_december_first() {
        let records = vec![
            record("app1", "2024-12-05T10:00:00Z"),
            record("app1", "2025-01-10T10:00:00Z"),
            record("app1", "2025-01-11T10:00:00Z"),
            record("app1", "2025-11-30T10:00:00Z"),
            record("app2", "2025-01-10T10:00:00Z"),
        ];
        let series = FiscalCalendar::default().bin_monthly(&records, "app1", None);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month, FiscalMonth::December);
        assert_eq!(series[0].count, 1);
        assert_eq!(series[1].count, 2);
        assert_eq!(series[11].month, FiscalMonth::November);
        assert_eq!(series[11].count, 1);
        assert_eq!(total_usage(&series), 4);
    }

    #[test]
    fn year_filter_uses_calendar_year() {
        let records = vec![
            record("app1", "2024-12-05T10:00:00Z"),
            record("app1", "2025-12-05T10:00:00Z"),
            record("app1", "2025-03-01T10:00:00Z"),
        ];
        let cal = FiscalCalendar::default();
        let series = cal.bin_monthly(&records, "app1", Some(2025));
        assert_eq!(series[FiscalMonth::December.fiscal_index()].count, 1);
        assert_eq!(series[FiscalMonth::March.fiscal_index()].count, 1);
        assert_eq!(total_usage(&series), 2);
    }

    #[test]
    fn unmatched_year_is_all_zero() {
        let records = vec![record("app1", "2025-03-01T10:00:00Z")];
        let series = FiscalCalendar::default().bin_monthly(&records, "app1", Some(1999));
        assert_eq!(series, placeholder_series());
    }

    #[test]
    fn unknown_app_is_all_zero() {
        let records = vec![record("app1", "2025-03-01T10:00:00Z")];
        let series = FiscalCalendar::default().bin_monthly(&records, "nope", None);
        assert_eq!(total_usage(&series), 0);
        assert_eq!(series.len(), 12);
    }

    #[test]
    fn timezone_moves_month_boundary() {
        let records = vec![record("app1", "2025-11-30T23:30:00Z")];
        let tokyo = FiscalCalendar::new(Timezone::parse(Some("Asia/Tokyo")).unwrap());
        let series = tokyo.bin_monthly(&records, "app1", None);
        assert_eq!(series[FiscalMonth::December.fiscal_index()].count, 1);

        let utc = FiscalCalendar::default().bin_monthly(&records, "app1", None);
        assert_eq!(utc[FiscalMonth::November.fiscal_index()].count, 1);
    }

    #[test]
    fn timezone_moves_year_boundary() {
        let r = record("app1", "2024-12-31T20:00:00Z");
        let tokyo = FiscalCalendar::new(Timezone::parse(Some("Asia/Tokyo")).unwrap());
        assert_eq!(tokyo.record_year(&r), 2025);
        assert_eq!(FiscalCalendar::default().record_year(&r), 2024);
    }
}
