//! Export command - write the filtered table as CSV

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

use fiscaldash_core::services::ExportResult;
use fiscaldash_core::{DashboardContext, EntryPoint, FilteredTable, LogEvent, LoggingService};

use super::{
    ensure_loaded, get_context, get_logger, load_folder, log_command, log_event, print_warnings,
    resolve_folder, FilterArgs,
};
use crate::output;

pub fn run(filters: &FilterArgs, output_path: Option<PathBuf>, json: bool) -> Result<()> {
    let logger = get_logger(EntryPoint::Cli);
    log_command(&logger, "export");

    let ctx = get_context()?;
    let folder = resolve_folder(filters.folder.clone(), &ctx);
    let outcome = load_folder(&ctx, &folder, &logger);
    if !json {
        print_warnings(&outcome);
    }
    ensure_loaded(&outcome)?;

    let criteria = filters.criteria(&outcome.table)?;
    let filtered = criteria.apply(&outcome.table);
    let target = output_path.unwrap_or_else(|| PathBuf::from("."));
    let result = write_export(&ctx, &filtered, &target, &folder, &logger)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::success(&format!(
            "Exported {} rows ({} columns) to {}",
            result.rows,
            result.columns,
            result.path.display()
        ));
    }
    Ok(())
}

/// Write `filtered` to `target`; a directory receives a timestamped file
pub fn write_export(
    ctx: &DashboardContext,
    filtered: &FilteredTable<'_>,
    target: &Path,
    folder: &Path,
    logger: &Option<LoggingService>,
) -> Result<ExportResult> {
    let result = if target.is_dir() {
        ctx.export_service
            .export_to_dir(filtered, target, Local::now().naive_local())
    } else {
        ctx.export_service.export_to_file(filtered, target)
    };

    match &result {
        Ok(written) => log_event(
            logger,
            LogEvent::new("export_written")
                .with_folder(folder.to_string_lossy())
                .with_source_file(written.path.to_string_lossy())
                .with_record_count(written.rows),
        ),
        Err(e) => log_event(
            logger,
            LogEvent::new("export_failed")
                .with_folder(folder.to_string_lossy())
                .with_error(format!("{:#}", e))
                .with_error_details(target.to_string_lossy()),
        ),
    }
    result
}
