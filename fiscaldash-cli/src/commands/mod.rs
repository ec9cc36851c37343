//! CLI command implementations

pub mod config;
pub mod dashboard;
pub mod export;
pub mod legend;
pub mod load;
pub mod logs;
pub mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use fiscaldash_core::{
    DashboardContext, DateRange, EntryPoint, FilterCriteria, FiscalTable, LoadOutcome, LogEvent,
    LoggingService, OperationResult, Selection,
};

use crate::output;

/// Folder scanned when neither the command line nor the settings name one
pub const DEFAULT_FOLDER_NAME: &str = "Notas fiscais de saída";

/// Date formats accepted on the command line
const DATE_ARG_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Filter options shared by `report` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Folder with the .xlsx/.xls files (defaults to the configured folder)
    #[arg(long, short)]
    pub folder: Option<PathBuf>,
    /// First emission date, inclusive (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub from: Option<String>,
    /// Last emission date, inclusive (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub to: Option<String>,
    /// Only this CFOP code
    #[arg(long)]
    pub cfop: Option<String>,
    /// Only this status (Situação)
    #[arg(long)]
    pub status: Option<String>,
}

impl FilterArgs {
    /// Build filter criteria; a single bound is completed with the table's span
    pub fn criteria(&self, table: &FiscalTable) -> Result<FilterCriteria> {
        let from = self.from.as_deref().map(parse_date_arg).transpose()?;
        let to = self.to.as_deref().map(parse_date_arg).transpose()?;

        let date_range = match (from, to, table.date_bounds()) {
            (None, None, _) => None,
            (Some(start), Some(end), _) => Some(DateRange::new(start, end)),
            (Some(start), None, Some((_, max))) => Some(DateRange::new(start, max.max(start))),
            (None, Some(end), Some((min, _))) => Some(DateRange::new(min.min(end), end)),
            (Some(day), None, None) | (None, Some(day), None) => Some(DateRange::new(day, day)),
        };

        Ok(FilterCriteria {
            date_range,
            code: Selection::from(self.cfop.clone()),
            status: Selection::from(self.status.clone()),
        })
    }
}

/// Parse a command-line date
pub fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    DATE_ARG_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| anyhow!("Invalid date '{}'. Use YYYY-MM-DD or DD/MM/YYYY", value))
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(entry_point: EntryPoint) -> Option<LoggingService> {
    let app_dir = get_app_dir();
    std::fs::create_dir_all(&app_dir).ok()?;
    LoggingService::new(&app_dir, entry_point, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Log a command execution, ignoring any errors
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Log the events of a folder load, ignoring any errors
pub fn log_load(logger: &Option<LoggingService>, outcome: &LoadOutcome) {
    if let Some(l) = logger {
        let _ = l.log_load(outcome);
    }
}

/// Get the application directory from environment or default
pub fn get_app_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FISCALDASH_DIR") {
        PathBuf::from(dir)
    } else {
        home_dir().join(".fiscaldash")
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Create the dashboard context from the application directory
pub fn get_context() -> Result<DashboardContext> {
    let app_dir = get_app_dir();

    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create application directory: {:?}", app_dir))?;

    DashboardContext::new(&app_dir).context("Failed to initialize dashboard context")
}

/// Folder to load: command line, then settings (or FISCALDASH_DATA_FOLDER), then the default
pub fn resolve_folder(arg: Option<PathBuf>, ctx: &DashboardContext) -> PathBuf {
    arg.or_else(|| ctx.config.data_folder.clone())
        .unwrap_or_else(default_folder)
}

pub fn default_folder() -> PathBuf {
    home_dir().join(DEFAULT_FOLDER_NAME)
}

/// Spinner shown while workbooks are read
pub fn loading_spinner(folder: &Path) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Loading {}", folder.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load a folder with a spinner, logging the outcome
pub fn load_folder(
    ctx: &DashboardContext,
    folder: &Path,
    logger: &Option<LoggingService>,
) -> LoadOutcome {
    let spinner = loading_spinner(folder);
    let outcome = ctx.load(folder);
    spinner.finish_and_clear();
    log_load(logger, &outcome);
    outcome
}

/// Print the non-fatal notices of a load
pub fn print_warnings(outcome: &LoadOutcome) {
    for issue in outcome.issues.iter().filter(|i| !i.is_fatal()) {
        output::warning(&format!("Warning: {}", issue));
    }
}

/// Fail with the fatal notice of a load, if any
pub fn ensure_loaded(outcome: &LoadOutcome) -> Result<()> {
    match outcome.issues.iter().find(|i| i.is_fatal()) {
        Some(issue) => Err(issue.clone().into()),
        None => Ok(()),
    }
}

/// JSON failure for a halted load, carrying the notice and the load summary
pub fn halted_result<T>(outcome: &LoadOutcome) -> Result<Option<OperationResult<T>>> {
    let Some(issue) = outcome.issues.iter().find(|i| i.is_fatal()) else {
        return Ok(None);
    };
    let mut context = HashMap::new();
    context.insert("issue".to_string(), serde_json::to_value(issue)?);
    context.insert("summary".to_string(), serde_json::to_value(outcome.summary())?);
    Ok(Some(OperationResult::fail_with_context(issue.to_string(), context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fiscaldash_core::adapters::CalamineReader;
    use fiscaldash_core::domain::ColumnCandidates;
    use fiscaldash_core::services::LoaderService;
    use fiscaldash_core::Record;
    use rust_decimal::Decimal;

    fn table() -> FiscalTable {
        let record = |d: u32| {
            let date = NaiveDate::from_ymd_opt(2025, 3, d);
            Record::new("a.xlsx", date, "5102", "Cancelada", Decimal::ONE)
        };
        FiscalTable::new(Vec::new(), vec![record(1), record(31)])
    }

    #[test]
    fn test_parse_date_arg_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_date_arg("2025-03-09").unwrap(), expected);
        assert_eq!(parse_date_arg("09/03/2025").unwrap(), expected);
        assert!(parse_date_arg("March 9").is_err());
    }

    #[test]
    fn test_single_bound_uses_table_span() {
        let args = FilterArgs {
            from: Some("2025-03-15".to_string()),
            ..Default::default()
        };
        let criteria = args.criteria(&table()).unwrap();
        let range = criteria.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_no_filters_is_all() {
        let criteria = FilterArgs::default().criteria(&table()).unwrap();
        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn test_halted_result_carries_issue_and_summary() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nowhere");
        let reader = Arc::new(CalamineReader::new());
        let outcome = LoaderService::new(reader, ColumnCandidates::default()).load(&missing);

        let failure = halted_result::<serde_json::Value>(&outcome).unwrap().unwrap();
        assert!(!failure.success);
        assert!(failure.data.is_none());
        assert!(failure.error.unwrap().starts_with("Folder not found"));
        let context = failure.context.unwrap();
        assert_eq!(context["issue"]["kind"], "directory_not_found");
        assert_eq!(context["summary"]["total_records"], 0);
    }

    #[test]
    fn test_halted_result_is_none_after_a_good_load() {
        let outcome = LoadOutcome {
            folder: PathBuf::from("/data"),
            files: Vec::new(),
            issues: Vec::new(),
            columns: Vec::new(),
            table: table(),
            loaded_at: chrono::Local::now(),
        };
        assert!(halted_result::<serde_json::Value>(&outcome).unwrap().is_none());
    }
}
