//! Report command - metrics, aggregation views and the detail pivot

use anyhow::Result;
use colored::Colorize;

use fiscaldash_core::services::ReportService;
use fiscaldash_core::{EntryPoint, FilterCriteria, OperationResult, Report};

use super::{
    ensure_loaded, get_context, get_logger, halted_result, load_folder, log_command,
    print_warnings, resolve_folder, FilterArgs,
};
use crate::output::{self, format_brl, format_percent};

pub fn run(filters: &FilterArgs, top: Option<usize>, json: bool) -> Result<()> {
    let logger = get_logger(EntryPoint::Cli);
    log_command(&logger, "report");

    let ctx = get_context()?;
    let folder = resolve_folder(filters.folder.clone(), &ctx);
    let outcome = load_folder(&ctx, &folder, &logger);
    if json {
        if let Some(failure) = halted_result::<serde_json::Value>(&outcome)? {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            return Ok(());
        }
    } else {
        print_warnings(&outcome);
    }
    ensure_loaded(&outcome)?;

    let criteria = filters.criteria(&outcome.table)?;
    let service = ReportService::new(top.unwrap_or(ctx.config.top_codes));
    let report = service.build(&criteria.apply(&outcome.table));

    if json {
        let result = OperationResult::ok(serde_json::json!({
            "folder": outcome.folder.to_string_lossy(),
            "filters": criteria,
            "report": report,
        }));
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_filters(&criteria);
    print_report(&report, service.top_n());
    Ok(())
}

/// One-line description of the active filters
pub fn print_filters(criteria: &FilterCriteria) {
    let period = criteria
        .date_range
        .map(|r| format!("{} to {}", r.start.format("%d/%m/%Y"), r.end.format("%d/%m/%Y")))
        .unwrap_or_else(|| "full period".to_string());
    println!(
        "{} {}  {} {}  {} {}",
        "Period:".bold(),
        period,
        "CFOP:".bold(),
        criteria.code.label(),
        "Status:".bold(),
        criteria.status.label()
    );
    println!();
}

/// Render every view of a report
pub fn print_report(report: &Report, top_n: usize) {
    if report.is_empty() {
        output::warning("No records match the selected filters.");
        return;
    }

    let metrics = &report.metrics;
    let mut table = output::create_table();
    table.set_header(vec!["Invoices", "Total ICMS", "Mean ICMS", "Cancelled", "Cancellation rate"]);
    table.add_row(vec![
        metrics.invoice_count.to_string(),
        format_brl(metrics.total_tax),
        format_brl(metrics.mean_tax),
        metrics.cancelled_count.to_string(),
        format_percent(metrics.cancellation_ratio),
    ]);
    println!("{}", "Summary".bold());
    println!("{}", table);
    println!();

    if !report.monthly.is_empty() {
        let mut table = output::create_table();
        table.set_header(vec!["Month", "ICMS", "Invoices"]);
        for point in &report.monthly {
            table.add_row(vec![
                point.month_year.clone(),
                format_brl(point.total_tax),
                point.invoice_count.to_string(),
            ]);
        }
        println!("{}", "ICMS by month".bold());
        println!("{}", table);
        println!();
    }

    let mut table = output::create_table();
    table.set_header(vec!["Status", "Invoices", "Share"]);
    for entry in &report.by_status {
        let share = entry.count as f64 / metrics.invoice_count as f64;
        table.add_row(vec![entry.status.clone(), entry.count.to_string(), format_percent(share)]);
    }
    println!("{}", "Invoices by status".bold());
    println!("{}", table);
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["CFOP", "Description", "ICMS"]);
    for entry in &report.top_codes {
        table.add_row(vec![
            entry.code.clone(),
            entry.description.clone(),
            format_brl(entry.total_tax),
        ]);
    }
    println!("{}", format!("Top {} CFOP by ICMS", top_n).bold());
    println!("{}", table);
    println!();

    if !report.heatmap.months.is_empty() {
        let mut table = output::create_table();
        let mut header = vec!["Status".to_string()];
        header.extend(report.heatmap.months.iter().cloned());
        table.set_header(header);
        for (status, counts) in report.heatmap.statuses.iter().zip(&report.heatmap.counts) {
            let mut row = vec![status.clone()];
            row.extend(counts.iter().map(|c| c.to_string()));
            table.add_row(row);
        }
        println!("{}", "Invoices by month and status".bold());
        println!("{}", table);
        println!();
    }

    let mut table = output::create_table();
    let mut header = vec!["CFOP".to_string(), "Description".to_string()];
    header.extend(report.pivot.statuses.iter().cloned());
    table.set_header(header);
    for row in &report.pivot.rows {
        let mut cells = vec![row.code.clone(), row.description.clone()];
        cells.extend(row.values.iter().map(|v| format_brl(*v)));
        table.add_row(cells);
    }
    println!("{}", "ICMS by CFOP and status".bold());
    println!("{}", table);
}
