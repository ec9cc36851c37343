//! Load command - scan the data folder and summarize what was read

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use fiscaldash_core::{EntryPoint, LoadOutcome, OperationResult};

use super::{
    ensure_loaded, get_context, get_logger, halted_result, load_folder, log_command,
    print_warnings, resolve_folder,
};
use crate::output;

pub fn run(folder: Option<PathBuf>, json: bool) -> Result<()> {
    let logger = get_logger(EntryPoint::Cli);
    log_command(&logger, "load");

    let ctx = get_context()?;
    let folder = resolve_folder(folder, &ctx);
    let outcome = load_folder(&ctx, &folder, &logger);

    if json {
        let result = match halted_result(&outcome)? {
            Some(failure) => failure,
            None => OperationResult::ok(outcome.summary()),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_summary(&outcome);
    print_warnings(&outcome);
    ensure_loaded(&outcome)?;

    println!();
    print_columns(&outcome);
    Ok(())
}

/// Folder, per-file results and totals of a load
pub fn print_summary(outcome: &LoadOutcome) {
    println!("{} {}", "Folder:".bold(), outcome.folder.display());
    if outcome.files.is_empty() {
        return;
    }

    output::info(&format!("{} file(s) found", outcome.files.len()));
    for file in &outcome.files {
        match (&file.rows, &file.error) {
            (Some(rows), _) => println!("  {} {} - {} records", "✓".green(), file.file, rows),
            (None, Some(error)) => println!("  {} {} - {}", "✗".red(), file.file, error),
            (None, None) => println!("  {} {}", "?".yellow(), file.file),
        }
    }

    if !outcome.is_halted() {
        println!();
        println!("{} {}", "Total records:".bold(), outcome.table.len());
        if let Some((first, last)) = outcome.table.period() {
            println!("{} {} to {}", "Period:".bold(), first, last);
        }
    }
}

fn print_columns(outcome: &LoadOutcome) {
    let mut table = output::create_table();
    table.set_header(vec!["Field", "Column"]);
    for choice in &outcome.columns {
        let column = match &choice.column {
            Some(name) => name.clone(),
            None => format!("(none, using {})", choice.field.fallback_label()),
        };
        table.add_row(vec![choice.field.label().to_string(), column]);
    }
    println!("{}", table);
}
