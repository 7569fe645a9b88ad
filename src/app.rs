use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::consts::{APP_DIR, DB_ENV, DB_FILE};
use crate::core::{FiscalCalendar, ReportScope, RunStatus, parse_elapsed};
use crate::error::{AppError, StoreError};
use crate::output::{
    NumberFormat, ReportTableOptions, SummaryOptions, output_monthly_csv, output_monthly_json,
    output_months_json, output_summary_csv, output_summary_json, print_monthly_table,
    print_summary_table,
};
use crate::pricing::RateCard;
use crate::store::{JsonFileSource, LoadResult, NewRecord, RecordSource, UsageDb, load_report};
use crate::utils::Timezone;

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) rates: &'a RateCard,
    pub(crate) calendar: FiscalCalendar,
    pub(crate) number_format: NumberFormat,
    pub(crate) db_path: Option<PathBuf>,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(cli: &'a Cli, config: &'a Config) -> Result<Self, AppError> {
        let timezone = Timezone::parse(cli.timezone.as_deref())?;
        let number_format = NumberFormat::from_locale(cli.locale.as_deref())?;
        let db_path = resolve_db_path(
            cli.db.as_deref(),
            std::env::var_os(DB_ENV).map(PathBuf::from),
            config.db_path.as_deref(),
        );
        tracing::debug!(timezone = %timezone.label(), db = ?db_path, "resolved settings");
        if cli.show_cost() && config.pricing.is_empty() {
            tracing::debug!("no [pricing] rates configured, costs will show as $0.00");
        }
        Ok(Self {
            cli,
            rates: &config.pricing,
            calendar: FiscalCalendar::new(timezone),
            number_format,
            db_path,
        })
    }

    fn table_options(&self) -> ReportTableOptions {
        ReportTableOptions {
            order: self.cli.order,
            use_color: self.cli.use_color(),
            compact: self.cli.compact,
            show_cost: self.cli.show_cost(),
            number_format: self.number_format,
        }
    }

    fn open_db(&self) -> Result<UsageDb, AppError> {
        let path = self.db_path.as_deref().ok_or(AppError::NoDatabasePath)?;
        Ok(UsageDb::open(path)?)
    }

    /// `--input` reads an export, otherwise the database
    fn open_source(&self) -> Result<Box<dyn RecordSource>, AppError> {
        match &self.cli.input {
            Some(path) => Ok(Box::new(JsonFileSource::new(path.clone()))),
            None => Ok(Box::new(self.open_db()?)),
        }
    }
}

/// `--db`, then `$TOOLSTATS_DB`, then the config file, then the platform data dir
fn resolve_db_path(
    flag: Option<&Path>,
    env: Option<PathBuf>,
    config: Option<&Path>,
) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or(env)
        .or_else(|| config.map(Path::to_path_buf))
        .or_else(|| dirs::data_local_dir().map(|d| d.join(APP_DIR).join(DB_FILE)))
}

fn summary_options(result: &LoadResult) -> SummaryOptions {
    SummaryOptions {
        in_scope: result.in_scope(),
        fetched: result.fetched,
        invalid_elapsed: result.invalid_elapsed(),
        elapsed_ms: Some(result.elapsed_ms),
    }
}

fn handle_summary(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let source = ctx.open_source()?;
    let scope = ReportScope::new(ctx.cli.year, None);
    let result = load_report(source.as_ref(), &ctx.calendar, &scope)?;
    let cli = ctx.cli;

    if result.groups.is_empty() && !cli.json && !cli.csv {
        println!("No successful runs found.");
        return Ok(());
    }
    if cli.json {
        println!(
            "{}",
            output_summary_json(&result.groups, ctx.rates, cli.order, cli.show_cost())
        );
    } else if cli.csv {
        print!(
            "{}",
            output_summary_csv(&result.groups, ctx.rates, cli.order, cli.show_cost())
        );
    } else {
        print_summary_table(
            &result.groups,
            ctx.rates,
            summary_options(&result),
            ctx.table_options(),
        );
    }
    Ok(())
}

fn handle_monthly(ctx: &CommandContext<'_>, app: &str) -> Result<(), AppError> {
    let source = ctx.open_source()?;
    let scope = ReportScope::new(ctx.cli.year, Some(app.to_string()));
    let result = load_report(source.as_ref(), &ctx.calendar, &scope)?;
    // A scoped report is non-empty or has already failed with NoAppRecords
    let Some(group) = result.groups.first() else {
        return Err(AppError::NoAppRecords {
            app_name: app.to_string(),
        });
    };
    let cli = ctx.cli;

    if cli.json {
        println!(
            "{}",
            output_monthly_json(group, ctx.rates, cli.year, cli.show_cost())
        );
    } else if cli.csv {
        print!("{}", output_monthly_csv(group, ctx.rates, cli.show_cost()));
    } else {
        print_monthly_table(
            group,
            ctx.rates,
            cli.year,
            summary_options(&result),
            ctx.table_options(),
        );
    }
    Ok(())
}

fn handle_start(
    ctx: &CommandContext<'_>,
    app: &str,
    endpoint: &str,
    task_id: &str,
) -> Result<(), AppError> {
    let db = ctx.open_db()?;
    let record = db.create_pending(app, endpoint, task_id, Utc::now())?;
    tracing::debug!(id = record.id, app, task_id, "run started");
    if ctx.cli.json {
        println!("{}", record_json(&record));
    } else {
        println!("{}", record.id);
    }
    Ok(())
}

fn handle_finish(
    ctx: &CommandContext<'_>,
    id: i64,
    task_id: &str,
    status: RunStatus,
    elapsed: &str,
) -> Result<(), AppError> {
    let seconds = parse_elapsed(elapsed).ok_or_else(|| AppError::InvalidElapsed {
        input: elapsed.to_string(),
    })?;
    let mut db = ctx.open_db()?;
    let record = db.complete(id, task_id, status, elapsed.trim())?;
    tracing::debug!(id, task_id, %status, seconds, "run finished");
    if ctx.cli.json {
        println!("{}", record_json(&record));
    } else {
        println!("Record {} {}", record.id, record.status);
    }
    Ok(())
}

fn handle_import(ctx: &CommandContext<'_>, file: &Path) -> Result<(), AppError> {
    let content = fs::read_to_string(file).map_err(|source| StoreError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let mut records: Vec<NewRecord> =
        serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: file.to_path_buf(),
            source,
        })?;
    normalize_elapsed(&mut records)?;

    let mut db = ctx.open_db()?;
    let inserted = db.insert_records(&records)?;
    tracing::debug!(inserted, file = %file.display(), "import complete");
    println!("Imported {inserted} records");
    Ok(())
}

/// Same rule as `finish`: elapsed times are stored trimmed and must parse
fn normalize_elapsed(records: &mut [NewRecord]) -> Result<(), AppError> {
    for record in records {
        if let Some(elapsed) = record.elapsed_time.as_mut() {
            if parse_elapsed(elapsed).is_none() {
                return Err(AppError::InvalidElapsed {
                    input: elapsed.clone(),
                });
            }
            *elapsed = elapsed.trim().to_string();
        }
    }
    Ok(())
}

fn handle_months(ctx: &CommandContext<'_>) {
    if ctx.cli.json {
        println!("{}", output_months_json());
        return;
    }
    for month in crate::core::FISCAL_MONTHS {
        println!("{:>2}  {}", month.fiscal_index(), month.name());
    }
}

fn record_json(record: &crate::core::UsageRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize record");
        String::new()
    })
}

pub(crate) fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let ctx = CommandContext::new(cli, config)?;
    match &cli.command {
        None | Some(Commands::Summary) => handle_summary(&ctx),
        Some(Commands::Monthly { app }) => handle_monthly(&ctx, app),
        Some(Commands::Start {
            app,
            endpoint,
            task_id,
        }) => handle_start(&ctx, app, endpoint, task_id),
        Some(Commands::Finish {
            id,
            task_id,
            status,
            elapsed,
        }) => handle_finish(&ctx, *id, task_id, *status, elapsed),
        Some(Commands::Import { file }) => handle_import(&ctx, file),
        Some(Commands::Months) => {
            handle_months(&ctx);
            Ok(())
        }
    }
}
