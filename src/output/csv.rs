use std::fmt::Write;

use crate::cli::SortOrder;
use crate::core::AppGroup;
use crate::output::format::sorted_groups;
use crate::pricing::{RateCard, calculate_cost};

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub(crate) fn output_summary_csv(
    groups: &[AppGroup],
    rates: &RateCard,
    order: SortOrder,
    show_cost: bool,
) -> String {
    let mut out = String::from(
        "app_name,endpoint,count,min_time,max_time,avg_time,total_time,invalid_elapsed",
    );
    if show_cost {
        out.push_str(",cost");
    }
    out.push('\n');

    for g in sorted_groups(groups, order) {
        let _ = write!(
            out,
            "{},{},{},{},{},{},{},{}",
            csv_escape(&g.app_name),
            csv_escape(&g.endpoint),
            g.count,
            g.min_time,
            g.max_time,
            g.avg_time,
            g.total_time,
            g.invalid_elapsed,
        );
        if show_cost {
            let _ = write!(out, ",{:.6}", calculate_cost(g.count, &g.app_name, rates));
        }
        out.push('\n');
    }
    out
}

/// One row per fiscal month, December first
pub(crate) fn output_monthly_csv(group: &AppGroup, rates: &RateCard, show_cost: bool) -> String {
    let rate = rates.rate_for(&group.app_name);
    let mut out = String::from("app_name,fiscal_index,month,count");
    if show_cost {
        out.push_str(",cost");
    }
    out.push('\n');

    for entry in group.monthly_or_placeholder() {
        let _ = write!(
            out,
            "{},{},{},{}",
            csv_escape(&group.app_name),
            entry.month.fiscal_index(),
            entry.month.name(),
            entry.count,
        );
        if show_cost {
            let _ = write!(out, ",{:.6}", entry.count as f64 * rate);
        }
        out.push('\n');
    }
    out
}
