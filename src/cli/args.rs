//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode, ConfigSortOrder};

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum SortOrder {
    /// Alphabetical by app name (default)
    #[default]
    Asc,
    /// Reverse alphabetical
    Desc,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "toolstats")]
#[command(about = "Usage aggregation and fiscal-month reports for internal tools", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// SQLite usage database (overrides $TOOLSTATS_DB and the config's db_path)
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) db: Option<PathBuf>,

    /// Read records from a JSON export instead of the database
    #[arg(short, long, global = true, value_name = "FILE")]
    pub(crate) input: Option<PathBuf>,

    /// Only count records created in this calendar year
    #[arg(short, long, global = true)]
    pub(crate) year: Option<i32>,

    /// Output as JSON
    #[arg(short, long, global = true, conflicts_with = "csv")]
    pub(crate) json: bool,

    /// Output as CSV
    #[arg(long, global = true)]
    pub(crate) csv: bool,

    /// Sort order for app rows
    #[arg(short, long, global = true, value_enum, default_value = "asc")]
    pub(crate) order: SortOrder,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Compact output (fewer columns)
    #[arg(short = 'c', long, global = true)]
    pub(crate) compact: bool,

    /// Hide cost columns
    #[arg(long, global = true)]
    pub(crate) no_cost: bool,

    /// Timezone used to place records in months (e.g. "UTC", "local", "America/Chicago")
    #[arg(long, global = true, value_name = "TZ")]
    pub(crate) timezone: Option<String>,

    /// Locale for number formatting (e.g., "en", "de", "fr")
    #[arg(long, global = true, value_name = "LOCALE")]
    pub(crate) locale: Option<String>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        // Boolean flags: config only applies while the CLI flag is off
        self.compact |= config.compact;
        self.no_cost |= config.no_cost;
        self.no_color |= config.no_color;
        self.debug |= config.debug;

        // Enums: config only overrides a CLI value still at its default
        if self.order == SortOrder::Asc && config.order == Some(ConfigSortOrder::Desc) {
            self.order = SortOrder::Desc;
        }
        if self.color == ColorMode::Auto {
            match config.color {
                Some(ConfigColorMode::Always) => self.color = ColorMode::Always,
                Some(ConfigColorMode::Never) => self.color = ColorMode::Never,
                Some(ConfigColorMode::Auto) | None => {}
            }
        }

        if self.timezone.is_none() {
            self.timezone = config.timezone.clone();
        }
        if self.locale.is_none() {
            self.locale = config.locale.clone();
        }
        self
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    pub(crate) fn show_cost(&self) -> bool {
        !self.no_cost
    }
}
