//! Dashboard command - interactive filter and report loop
//!
//! Each action re-runs the load-filter-render pass. Loads go through a
//! session cache, so only "Reload data" or a new folder rescans files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{Input, Select};

use fiscaldash_core::domain::filter::ALL_LABEL;
use fiscaldash_core::{
    DashboardContext, DateRange, EntryPoint, FilterCriteria, FiscalTable, LoadCache, LoadOutcome,
    LoggingService, Selection,
};

use super::export::write_export;
use super::load::print_summary;
use super::report::{print_filters, print_report};
use super::{
    get_context, get_logger, loading_spinner, log_command, log_load, parse_date_arg,
    print_warnings, resolve_folder,
};
use crate::output;

const ACTIONS: [&str; 8] = [
    "Set period",
    "Select CFOP",
    "Select status",
    "Clear filters",
    "Export CSV",
    "Change folder",
    "Reload data",
    "Quit",
];

/// Actions offered when the folder could not be loaded
const HALTED_ACTIONS: [&str; 3] = ["Change folder", "Reload data", "Quit"];

struct Session {
    ctx: DashboardContext,
    cache: LoadCache,
    folder: PathBuf,
    criteria: FilterCriteria,
    logger: Option<LoggingService>,
}

impl Session {
    /// Load the current folder through the cache; fresh loads print their summary
    fn load(&mut self, force_reload: bool) -> Arc<LoadOutcome> {
        if !force_reload {
            if let Some(outcome) = self.cache.get(&self.folder) {
                return outcome;
            }
        }

        let spinner = loading_spinner(&self.folder);
        let outcome = self.ctx.load_cached(&mut self.cache, &self.folder, true);
        spinner.finish_and_clear();
        log_load(&self.logger, &outcome);

        print_summary(&outcome);
        print_warnings(&outcome);
        println!();
        outcome
    }
}

pub fn run(folder: Option<PathBuf>) -> Result<()> {
    if atty::isnt(atty::Stream::Stdin) || atty::isnt(atty::Stream::Stdout) {
        bail!("The dashboard needs an interactive terminal. Use 'fdash report' instead.");
    }

    let logger = get_logger(EntryPoint::Dashboard);
    log_command(&logger, "dashboard");

    let ctx = get_context()?;
    let folder = resolve_folder(folder, &ctx);
    let mut session = Session {
        ctx,
        cache: LoadCache::new(),
        folder,
        criteria: FilterCriteria::default(),
        logger,
    };

    let mut force_reload = false;
    loop {
        let outcome = session.load(force_reload);
        force_reload = false;

        let action = if let Some(fatal) = outcome.issues.iter().find(|i| i.is_fatal()) {
            output::error(&fatal.to_string());
            choose(&HALTED_ACTIONS)?
        } else {
            let report = session.ctx.report(&outcome.table, &session.criteria);
            print_filters(&session.criteria);
            print_report(&report, session.ctx.report_service.top_n());
            println!();
            choose(&ACTIONS)?
        };

        match action {
            "Set period" => session.criteria.date_range = prompt_period(&outcome.table)?,
            "Select CFOP" => {
                session.criteria.code = prompt_selection("CFOP", outcome.table.codes())?
            }
            "Select status" => {
                session.criteria.status = prompt_selection("Status", outcome.table.statuses())?
            }
            "Clear filters" => session.criteria = FilterCriteria::default(),
            "Export CSV" => {
                let filtered = session.criteria.apply(&outcome.table);
                let target = std::env::current_dir()?;
                let written = write_export(
                    &session.ctx,
                    &filtered,
                    &target,
                    &session.folder,
                    &session.logger,
                );
                match written {
                    Ok(result) => output::success(&format!(
                        "Exported {} rows to {}",
                        result.rows,
                        result.path.display()
                    )),
                    Err(e) => output::error(&format!("Export failed: {:#}", e)),
                }
            }
            "Change folder" => {
                let current = session.folder.to_string_lossy().to_string();
                let folder: String = Input::new()
                    .with_prompt("Data folder")
                    .default(current)
                    .interact_text()?;
                session.folder = PathBuf::from(folder.trim());
                session.criteria = FilterCriteria::default();
            }
            "Reload data" => force_reload = true,
            _ => break,
        }
        println!();
    }

    println!("{}", "Bye.".dimmed());
    Ok(())
}

fn choose(actions: &[&'static str]) -> Result<&'static str> {
    let index = Select::new()
        .with_prompt("Action")
        .items(actions)
        .default(0)
        .interact()?;
    Ok(actions[index])
}

/// Ask for the date range; defaults span the whole table
fn prompt_period(table: &FiscalTable) -> Result<Option<DateRange>> {
    let Some((min, max)) = table.date_bounds() else {
        output::warning("No dated records to filter by period.");
        return Ok(None);
    };

    let start: String = Input::new()
        .with_prompt("From (DD/MM/YYYY)")
        .default(min.format("%d/%m/%Y").to_string())
        .validate_with(|v: &String| parse_date_arg(v).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;
    let end: String = Input::new()
        .with_prompt("To (DD/MM/YYYY)")
        .default(max.format("%d/%m/%Y").to_string())
        .validate_with(|v: &String| parse_date_arg(v).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;

    let range = DateRange::new(parse_date_arg(&start)?, parse_date_arg(&end)?);
    if range.start == min && range.end == max {
        Ok(None)
    } else {
        Ok(Some(range))
    }
}

fn prompt_selection(prompt: &str, values: Vec<String>) -> Result<Selection> {
    let mut items = vec![ALL_LABEL.to_string()];
    items.extend(values);

    let index = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;
    Ok(Selection::from_choice(&items[index]))
}
