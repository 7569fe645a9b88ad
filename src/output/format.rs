use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};

use crate::cli::SortOrder;
use crate::core::AppGroup;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct NumberFormat {
    group_sep: char,
    decimal_sep: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            group_sep: ',',
            decimal_sep: '.',
        }
    }
}

impl NumberFormat {
    pub(crate) fn from_locale(locale: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = locale else {
            return Ok(NumberFormat::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NumberFormat::default());
        }
        let base = trimmed
            .split(['-', '_'])
            .next()
            .unwrap_or(trimmed)
            .to_ascii_lowercase();

        match base.as_str() {
            "de" => Ok(NumberFormat {
                group_sep: '.',
                decimal_sep: ',',
            }),
            "fr" | "ru" => Ok(NumberFormat {
                group_sep: ' ',
                decimal_sep: ',',
            }),
            "en" | "zh" => Ok(NumberFormat::default()),
            _ => Err(AppError::UnsupportedLocale {
                input: trimmed.to_string(),
            }),
        }
    }
}

pub(super) fn format_count(n: u64, format: NumberFormat) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(format.group_sep);
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub(super) fn format_cost(cost: f64, format: NumberFormat) -> String {
    let s = format!("${cost:.2}");
    if format.decimal_sep == '.' {
        s
    } else {
        s.replace('.', &format.decimal_sep.to_string())
    }
}

/// Groups ordered by app name
pub(super) fn sorted_groups(groups: &[AppGroup], order: SortOrder) -> Vec<&AppGroup> {
    let mut sorted: Vec<&AppGroup> = groups.iter().collect();
    match order {
        SortOrder::Asc => sorted.sort_by(|a, b| a.app_name.cmp(&b.app_name)),
        SortOrder::Desc => sorted.sort_by(|a, b| b.app_name.cmp(&a.app_name)),
    }
    sorted
}

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn right_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    styled_cell(text, color, bold).set_alignment(CellAlignment::Right)
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}
