//! Elapsed-time strings ("1.5s") as stored on usage records

use crate::consts::ELAPSED_UNIT;

/// Parse a duration string by stripping its trailing unit.
///
/// Returns `None` for anything that does not leave a finite, non-negative
/// number behind. The aggregator counts those as zero, so an all-zero summary
/// usually means the source data needs checking.
pub(crate) fn parse_elapsed(raw: &str) -> Option<f64> {
    let numeric = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_end();
    let value: f64 = numeric.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // "-0" would otherwise render as "-0s"
    Some(if value == 0.0 { 0.0 } else { value })
}

/// Whole numbers render without a decimal point, everything else with the
/// shortest representation that round-trips.
pub(crate) fn format_elapsed(seconds: f64) -> String {
    format!("{seconds}{ELAPSED_UNIT}")
}

/// Averages always carry exactly two decimals
pub(crate) fn format_average(seconds: f64) -> String {
    format!("{seconds:.2}{ELAPSED_UNIT}")
}
