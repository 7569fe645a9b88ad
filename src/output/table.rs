use comfy_table::{Cell, Color, Table};

use crate::cli::SortOrder;
use crate::core::{AppGroup, total_usage};
use crate::output::format::{
    NumberFormat, create_styled_table, format_cost, format_count, header_cell, right_cell,
    sorted_groups, styled_cell,
};
use crate::pricing::{RateCard, calculate_cost};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportTableOptions {
    pub(crate) order: SortOrder,
    pub(crate) use_color: bool,
    pub(crate) compact: bool,
    pub(crate) show_cost: bool,
    pub(crate) number_format: NumberFormat,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SummaryOptions {
    /// Records counted in the report
    pub(crate) in_scope: u64,
    /// Successful records returned by the source before scoping
    pub(crate) fetched: usize,
    pub(crate) invalid_elapsed: u64,
    pub(crate) elapsed_ms: Option<f64>,
}

fn summary_text(summary: SummaryOptions, number_format: NumberFormat) -> String {
    let mut text = format!(
        "{} successful records",
        format_count(summary.in_scope, number_format)
    );
    if summary.fetched as u64 != summary.in_scope {
        text.push_str(&format!(
            " in scope of {} fetched",
            format_count(summary.fetched as u64, number_format)
        ));
    }
    if summary.invalid_elapsed > 0 {
        text.push_str(&format!(
            " ({} with unreadable elapsed time counted as 0s)",
            format_count(summary.invalid_elapsed, number_format)
        ));
    }
    text
}

/// Print the summary line with optional timing
pub(crate) fn print_summary_line(summary: SummaryOptions, number_format: NumberFormat, use_color: bool) {
    let stats_text = summary_text(summary, number_format);
    match summary.elapsed_ms {
        Some(ms) if use_color => println!("\n  {stats_text} | \x1b[36m{ms:.0}ms\x1b[0m\n"),
        Some(ms) => println!("\n  {stats_text} | {ms:.0}ms\n"),
        None => println!("\n  {stats_text}\n"),
    }
}

fn colors(use_color: bool) -> (Option<Color>, Option<Color>) {
    if use_color {
        (Some(Color::Cyan), Some(Color::Green))
    } else {
        (None, None)
    }
}

pub(super) fn build_summary_table(
    groups: &[AppGroup],
    rates: &RateCard,
    options: ReportTableOptions,
) -> Table {
    let c = options.use_color;
    let nf = options.number_format;
    let (cyan, green) = colors(c);

    let mut header = vec![header_cell("App", c)];
    if !options.compact {
        header.push(header_cell("Endpoint", c));
    }
    header.push(header_cell("Calls", c));
    if !options.compact {
        header.extend([header_cell("Min", c), header_cell("Max", c)]);
    }
    header.extend([header_cell("Avg", c), header_cell("Total", c)]);
    if options.show_cost {
        header.push(header_cell("Cost", c));
    }

    let mut table = create_styled_table();
    table.set_header(header);

    let mut total_calls = 0u64;
    let mut total_cost = 0.0;
    for group in sorted_groups(groups, options.order) {
        let cost = calculate_cost(group.count, &group.app_name, rates);
        total_calls += group.count;
        total_cost += cost;

        let mut row = vec![Cell::new(&group.app_name)];
        if !options.compact {
            row.push(Cell::new(&group.endpoint));
        }
        row.push(right_cell(&format_count(group.count, nf), None, false));
        if !options.compact {
            row.push(right_cell(&group.min_time, None, false));
            row.push(right_cell(&group.max_time, None, false));
        }
        row.push(right_cell(&group.avg_time, None, false));
        row.push(right_cell(&group.total_time, None, false));
        if options.show_cost {
            row.push(right_cell(&format_cost(cost, nf), green, false));
        }
        table.add_row(row);
    }

    let mut total = vec![styled_cell("TOTAL", cyan, true)];
    if !options.compact {
        total.push(Cell::new(""));
    }
    total.push(right_cell(&format_count(total_calls, nf), cyan, true));
    let blanks = if options.compact { 2 } else { 4 };
    total.extend((0..blanks).map(|_| Cell::new("")));
    if options.show_cost {
        total.push(right_cell(&format_cost(total_cost, nf), green, true));
    }
    table.add_row(total);
    table
}

pub(super) fn build_monthly_table(
    group: &AppGroup,
    rates: &RateCard,
    options: ReportTableOptions,
) -> Table {
    let c = options.use_color;
    let nf = options.number_format;
    let (cyan, green) = colors(c);
    let rate = rates.rate_for(&group.app_name);

    let mut header = vec![header_cell("Month", c), header_cell("Calls", c)];
    if options.show_cost {
        header.push(header_cell("Cost", c));
    }
    let mut table = create_styled_table();
    table.set_header(header);

    // Fiscal order is the point of this table; --order does not apply here
    let series = group.monthly_or_placeholder();
    for entry in &series {
        let label = if options.compact {
            entry.month.short_name()
        } else {
            entry.month.name()
        };
        let mut row = vec![Cell::new(label), right_cell(&format_count(entry.count, nf), None, false)];
        if options.show_cost {
            row.push(right_cell(&format_cost(entry.count as f64 * rate, nf), green, false));
        }
        table.add_row(row);
    }

    let total_calls = total_usage(&series);
    let mut total = vec![
        styled_cell("TOTAL", cyan, true),
        right_cell(&format_count(total_calls, nf), cyan, true),
    ];
    if options.show_cost {
        total.push(right_cell(&format_cost(total_calls as f64 * rate, nf), green, true));
    }
    table.add_row(total);
    table
}

pub(crate) fn print_summary_table(
    groups: &[AppGroup],
    rates: &RateCard,
    summary: SummaryOptions,
    options: ReportTableOptions,
) {
    let table = build_summary_table(groups, rates, options);
    println!("\n  Tool Usage\n");
    println!("{table}");
    print_summary_line(summary, options.number_format, options.use_color);
}

pub(crate) fn print_monthly_table(
    group: &AppGroup,
    rates: &RateCard,
    year: Option<i32>,
    summary: SummaryOptions,
    options: ReportTableOptions,
) {
    let table = build_monthly_table(group, rates, options);
    let scope = year.map_or_else(|| "all years".to_string(), |y| y.to_string());
    println!("\n  {} ({}) - fiscal months, {}\n", group.app_name, group.endpoint, scope);
    println!("{table}");
    print_summary_line(summary, options.number_format, options.use_color);
}
