use serde_json::{Value, json};

use crate::cli::SortOrder;
use crate::core::{AppGroup, MonthlyUsage, total_usage};
use crate::output::format::sorted_groups;
use crate::pricing::{RateCard, calculate_cost};

fn series_value(series: &[MonthlyUsage], rate: f64, show_cost: bool) -> Value {
    let entries: Vec<Value> = series
        .iter()
        .map(|entry| {
            let mut obj = json!({ "month": entry.month, "count": entry.count });
            if show_cost {
                obj["cost"] = json!(entry.count as f64 * rate);
            }
            obj
        })
        .collect();
    Value::Array(entries)
}

fn group_value(group: &AppGroup, rates: &RateCard, show_cost: bool) -> Value {
    let rate = rates.rate_for(&group.app_name);
    let mut obj = json!({
        "app_name": group.app_name,
        "endpoint": group.endpoint,
        "count": group.count,
        "min_time": group.min_time,
        "max_time": group.max_time,
        "avg_time": group.avg_time,
        "total_time": group.total_time,
        "invalid_elapsed": group.invalid_elapsed,
        "monthly_usage": series_value(&group.monthly_or_placeholder(), rate, show_cost),
    });
    if show_cost {
        obj["cost"] = json!(group.count as f64 * rate);
    }
    obj
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize JSON output");
        "[]".to_string()
    })
}

pub(crate) fn output_summary_json(
    groups: &[AppGroup],
    rates: &RateCard,
    order: SortOrder,
    show_cost: bool,
) -> String {
    let output: Vec<Value> = sorted_groups(groups, order)
        .into_iter()
        .map(|g| group_value(g, rates, show_cost))
        .collect();
    to_pretty(&Value::Array(output))
}

pub(crate) fn output_monthly_json(
    group: &AppGroup,
    rates: &RateCard,
    year: Option<i32>,
    show_cost: bool,
) -> String {
    let series = group.monthly_or_placeholder();
    let mut obj = json!({
        "app_name": group.app_name,
        "endpoint": group.endpoint,
        "year": year,
        "total": total_usage(&series),
        "monthly_usage": series_value(&series, rates.rate_for(&group.app_name), show_cost),
    });
    if show_cost {
        obj["cost"] = json!(calculate_cost(group.count, &group.app_name, rates));
    }
    to_pretty(&obj)
}

/// Fiscal month names in reporting order
pub(crate) fn output_months_json() -> String {
    let months: Vec<Value> = crate::core::FISCAL_MONTHS
        .iter()
        .map(|m| json!({ "fiscal_index": m.fiscal_index(), "name": m.name() }))
        .collect();
    to_pretty(&Value::Array(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FISCAL_MONTHS;

    fn group(name: &str, count: u64) -> AppGroup {
        AppGroup {
            app_name: name.into(),
            endpoint: "/e1".into(),
            count,
            min_time: "1s".into(),
            max_time: "3s".into(),
            avg_time: "2.00s".into(),
            total_time: "4s".into(),
            invalid_elapsed: 0,
            monthly_usage: FISCAL_MONTHS
                .iter()
                .map(|&month| MonthlyUsage {
                    month,
                    count: if month.fiscal_index() == 1 { count } else { 0 },
                })
                .collect(),
        }
    }

    #[test]
    fn summary_json_shape() {
        let groups = vec![group("zeta", 1), group("app1", 2)];
        let parsed: Value =
            serde_json::from_str(&output_summary_json(&groups, &RateCard::default(), SortOrder::Asc, false))
                .unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["app_name"], "app1");
        assert_eq!(arr[0]["count"], 2);
        assert_eq!(arr[0]["avg_time"], "2.00s");
        assert_eq!(arr[0]["monthly_usage"].as_array().unwrap().len(), 12);
        assert_eq!(arr[0]["monthly_usage"][0]["month"], "December");
        assert_eq!(arr[0]["monthly_usage"][1]["count"], 2);
        assert!(arr[0].get("cost").is_none());
    }

    #[test]
    fn monthly_json_includes_cost_when_enabled() {
        let rates = RateCard {
            default_per_call: 0.5,
            ..RateCard::default()
        };
        let parsed: Value =
            serde_json::from_str(&output_monthly_json(&group("app1", 4), &rates, Some(2025), true)).unwrap();
        assert_eq!(parsed["year"], 2025);
        assert_eq!(parsed["total"], 4);
        assert_eq!(parsed["cost"].as_f64().unwrap(), 2.0);
        assert_eq!(parsed["monthly_usage"][1]["cost"].as_f64().unwrap(), 2.0);
        assert_eq!(parsed["monthly_usage"][0]["cost"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn months_json_is_december_first() {
        let parsed: Value = serde_json::from_str(&output_months_json()).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 12);
        assert_eq!(arr[0]["name"], "December");
        assert_eq!(arr[11]["name"], "November");
        assert_eq!(arr[11]["fiscal_index"], 11);
    }
}
