//! Report service - summary metrics and chart-ready aggregations

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::DEFAULT_TOP_CODES;
use crate::domain::{FilteredTable, Record};

/// Scalar metrics over the filtered records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub invoice_count: usize,
    pub total_tax: Decimal,
    pub mean_tax: Decimal,
    pub cancelled_count: usize,
    /// Cancelled / total, in 0..=1; zero when there are no records
    pub cancellation_ratio: f64,
}

/// One point of the monthly series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month_year: String,
    pub total_tax: Decimal,
    pub invoice_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeTotal {
    pub code: String,
    pub description: String,
    pub total_tax: Decimal,
}

/// Invoice counts with statuses as rows and months as columns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusHeatmap {
    pub statuses: Vec<String>,
    pub months: Vec<String>,
    /// `counts[status][month]`
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub code: String,
    pub description: String,
    /// Summed tax per status, aligned with [`CodeStatusPivot::statuses`]
    pub values: Vec<Decimal>,
}

/// Tax totals by code+description (rows) and status (columns)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeStatusPivot {
    pub statuses: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// Everything rendered for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub metrics: SummaryMetrics,
    pub monthly: Vec<MonthlyPoint>,
    pub by_status: Vec<StatusCount>,
    pub top_codes: Vec<CodeTotal>,
    pub heatmap: StatusHeatmap,
    pub pivot: CodeStatusPivot,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.metrics.invoice_count == 0
    }
}

/// Report service: aggregates filtered records
pub struct ReportService {
    top_n: usize,
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_CODES)
    }
}

impl ReportService {
    pub fn new(top_n: usize) -> Self {
        Self { top_n: top_n.max(1) }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Build the full report; an empty view yields zero metrics and empty views
    pub fn build(&self, filtered: &FilteredTable<'_>) -> Report {
        let records = filtered.records.as_slice();
        Report {
            metrics: summarize(records),
            monthly: monthly_series(records),
            by_status: status_distribution(records),
            top_codes: top_codes(records, self.top_n),
            heatmap: status_heatmap(records),
            pivot: code_status_pivot(records),
        }
    }
}

pub fn summarize(records: &[&Record]) -> SummaryMetrics {
    let invoice_count = records.len();
    let total_tax = records
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.tax_value));
    let cancelled_count = records.iter().filter(|r| r.is_cancelled()).count();

    let (mean_tax, cancellation_ratio) = if invoice_count == 0 {
        (Decimal::ZERO, 0.0)
    } else {
        (
            total_tax / Decimal::from(invoice_count),
            cancelled_count as f64 / invoice_count as f64,
        )
    };

    SummaryMetrics {
        invoice_count,
        total_tax,
        mean_tax,
        cancelled_count,
        cancellation_ratio,
    }
}

/// Tax sum and invoice count per month, ascending; undated records are skipped
pub fn monthly_series(records: &[&Record]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for record in records {
        if let Some(label) = record.month_year_label.as_deref() {
            let entry = months.entry(label).or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(record.tax_value);
            entry.1 += 1;
        }
    }
    months
        .into_iter()
        .map(|(month_year, (total_tax, invoice_count))| MonthlyPoint {
            month_year: month_year.to_string(),
            total_tax,
            invoice_count,
        })
        .collect()
}

/// Invoice count per status, most frequent first
pub fn status_distribution(records: &[&Record]) -> Vec<StatusCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.status.as_str()).or_default() += 1;
    }
    let mut result: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status, count)| StatusCount { status: status.to_string(), count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    result
}

/// Highest tax totals by code+description, at most `limit` entries
pub fn top_codes(records: &[&Record], limit: usize) -> Vec<CodeTotal> {
    let mut totals: HashMap<(&str, &str), Decimal> = HashMap::new();
    for record in records {
        let total = totals
            .entry((record.tax_operation_code.as_str(), record.tax_operation_description.as_str()))
            .or_insert(Decimal::ZERO);
        *total = total.saturating_add(record.tax_value);
    }
    let mut result: Vec<CodeTotal> = totals
        .into_iter()
        .map(|((code, description), total_tax)| CodeTotal {
            code: code.to_string(),
            description: description.to_string(),
            total_tax,
        })
        .collect();
    result.sort_by(|a, b| {
        b.total_tax
            .cmp(&a.total_tax)
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.description.cmp(&b.description))
    });
    result.truncate(limit);
    result
}

/// Month × status counts over dated records, zero-filled
pub fn status_heatmap(records: &[&Record]) -> StatusHeatmap {
    let dated: Vec<(&str, &str)> = records
        .iter()
        .filter_map(|r| r.month_year_label.as_deref().map(|m| (m, r.status.as_str())))
        .collect();

    let months: Vec<String> = dated
        .iter()
        .map(|(m, _)| *m)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let statuses: Vec<String> = dated
        .iter()
        .map(|(_, s)| *s)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut counts = vec![vec![0usize; months.len()]; statuses.len()];
    for (month, status) in dated {
        let row = statuses.iter().position(|s| s == status);
        let col = months.iter().position(|m| m == month);
        if let (Some(row), Some(col)) = (row, col) {
            counts[row][col] += 1;
        }
    }

    StatusHeatmap { statuses, months, counts }
}

/// Summed tax by code+description and status, zero-filled
pub fn code_status_pivot(records: &[&Record]) -> CodeStatusPivot {
    let statuses: Vec<String> = records
        .iter()
        .map(|r| r.status.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut cells: BTreeMap<(&str, &str), Vec<Decimal>> = BTreeMap::new();
    for record in records {
        let col = statuses
            .iter()
            .position(|s| *s == record.status)
            .unwrap_or_default();
        let values = cells
            .entry((record.tax_operation_code.as_str(), record.tax_operation_description.as_str()))
            .or_insert_with(|| vec![Decimal::ZERO; statuses.len()]);
        values[col] = values[col].saturating_add(record.tax_value);
    }

    let rows = cells
        .into_iter()
        .map(|((code, description), values)| PivotRow {
            code: code.to_string(),
            description: description.to_string(),
            values,
        })
        .collect();

    CodeStatusPivot { statuses, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::DEFAULT_STATUS;
    use crate::domain::FiscalTable;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rec(month: Option<u32>, code: &str, status: &str, value: &str) -> Record {
        let date = month.map(|m| NaiveDate::from_ymd_opt(2025, m, 10).unwrap());
        Record::new("a.xlsx", date, code, status, dec(value))
    }

    fn sample() -> FiscalTable {
        FiscalTable::new(
            Vec::new(),
            vec![
                rec(Some(1), "5102", DEFAULT_STATUS, "10"),
                rec(Some(1), "5910", "Cancelada", "4"),
                rec(Some(2), "5102", DEFAULT_STATUS, "6"),
                rec(Some(2), "6910", DEFAULT_STATUS, "30"),
                rec(None, "5102", "Cancelada", "0"),
            ],
        )
    }

    #[test]
    fn test_summary_metrics() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();
        let metrics = summarize(&records);

        assert_eq!(metrics.invoice_count, 5);
        assert_eq!(metrics.total_tax, dec("50"));
        assert_eq!(metrics.mean_tax, dec("10"));
        assert_eq!(metrics.cancelled_count, 2);
        assert!((metrics.cancellation_ratio - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_set_is_neutral() {
        let metrics = summarize(&[]);
        assert_eq!(metrics.invoice_count, 0);
        assert_eq!(metrics.total_tax, Decimal::ZERO);
        assert_eq!(metrics.mean_tax, Decimal::ZERO);
        assert_eq!(metrics.cancellation_ratio, 0.0);

        let table = FiscalTable::default();
        let filtered = crate::domain::FilterCriteria::default().apply(&table);
        let report = ReportService::default().build(&filtered);
        assert!(report.is_empty());
        assert!(report.monthly.is_empty());
        assert!(report.heatmap.counts.is_empty());
        assert!(report.pivot.rows.is_empty());
    }

    #[test]
    fn test_monthly_series_skips_undated() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();
        let series = monthly_series(&records);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].month_year, "2025-01");
        assert_eq!(series[0].total_tax, dec("14"));
        assert_eq!(series[0].invoice_count, 2);
        assert_eq!(series[1].month_year, "2025-02");
        assert_eq!(series[1].total_tax, dec("36"));
    }

    #[test]
    fn test_status_distribution_orders_by_count() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();
        let distribution = status_distribution(&records);

        assert_eq!(distribution[0].status, DEFAULT_STATUS);
        assert_eq!(distribution[0].count, 3);
        assert_eq!(distribution[1].status, "Cancelada");
        assert_eq!(distribution[1].count, 2);
    }

    #[test]
    fn test_top_codes_sorted_and_limited() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();

        let top = top_codes(&records, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "6910");
        assert_eq!(top[0].total_tax, dec("30"));
        assert_eq!(top[1].code, "5102");
        assert_eq!(top[1].description, "Venda de mercadorias");
        assert_eq!(top[1].total_tax, dec("16"));
    }

    #[test]
    fn test_heatmap_counts() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();
        let heatmap = status_heatmap(&records);

        assert_eq!(heatmap.months, vec!["2025-01", "2025-02"]);
        assert_eq!(heatmap.statuses, vec!["Cancelada", DEFAULT_STATUS]);
        assert_eq!(heatmap.counts, vec![vec![1, 0], vec![1, 2]]);
    }

    #[test]
    fn test_pivot_zero_fills_missing_cells() {
        let table = sample();
        let records: Vec<&Record> = table.records.iter().collect();
        let pivot = code_status_pivot(&records);

        assert_eq!(pivot.statuses, vec!["Cancelada", DEFAULT_STATUS]);
        assert_eq!(pivot.rows.len(), 3);

        let row_5102 = &pivot.rows[0];
        assert_eq!(row_5102.code, "5102");
        assert_eq!(row_5102.values, vec![dec("0"), dec("16")]);

        let row_6910 = pivot.rows.iter().find(|r| r.code == "6910").unwrap();
        assert_eq!(row_6910.values, vec![Decimal::ZERO, dec("30")]);
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let table = FiscalTable::new(
            Vec::new(),
            vec![
                Record::new("a.xlsx", None, "5102", DEFAULT_STATUS, Decimal::MAX),
                Record::new("b.xlsx", None, "5102", DEFAULT_STATUS, Decimal::MAX),
            ],
        );
        let filtered = crate::domain::FilterCriteria::default().apply(&table);
        let report = ReportService::default().build(&filtered);

        assert_eq!(report.metrics.total_tax, Decimal::MAX);
        assert_eq!(report.top_codes[0].total_tax, Decimal::MAX);
        assert_eq!(report.pivot.rows[0].values, vec![Decimal::MAX]);
    }
}
