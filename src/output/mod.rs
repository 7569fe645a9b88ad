mod csv;
mod format;
mod json;
mod table;

pub(crate) use csv::{output_monthly_csv, output_summary_csv};
pub(crate) use format::NumberFormat;
pub(crate) use json::{output_monthly_json, output_months_json, output_summary_json};
pub(crate) use table::{ReportTableOptions, SummaryOptions, print_monthly_table, print_summary_table};
