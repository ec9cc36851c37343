//! Invoice record domain model

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::cell::CellValue;
use super::cfop;

/// Status assigned when no status value is available
pub const DEFAULT_STATUS: &str = "Emitida DANFE";

/// Status counted by the cancellation ratio
pub const CANCELLED_STATUS: &str = "Cancelada";

/// Emission date assigned when no date column exists in any file
pub fn default_emission_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// `YYYY-MM` grouping key for a date
pub fn month_year_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// One normalized invoice line of the unified table
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// File name the row was read from
    pub source_file: String,
    pub emission_date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub month_year_label: Option<String>,
    pub tax_operation_code: String,
    pub tax_operation_description: String,
    pub status: String,
    /// ICMS amount, never negative
    pub tax_value: Decimal,
    /// Original cells, aligned with [`FiscalTable::raw_columns`]
    #[serde(skip)]
    pub raw: Vec<CellValue>,
}

impl Record {
    /// Build a record, deriving the calendar fields and the description
    pub fn new(
        source_file: impl Into<String>,
        emission_date: Option<NaiveDate>,
        tax_operation_code: impl Into<String>,
        status: impl Into<String>,
        tax_value: Decimal,
    ) -> Self {
        let tax_operation_code = tax_operation_code.into();
        let tax_operation_description = cfop::describe(&tax_operation_code).to_string();

        Self {
            source_file: source_file.into(),
            emission_date,
            month: emission_date.map(|d| d.month()),
            year: emission_date.map(|d| d.year()),
            month_year_label: emission_date.map(month_year_label),
            tax_operation_code,
            tax_operation_description,
            status: status.into(),
            tax_value: tax_value.max(Decimal::ZERO),
            raw: Vec::new(),
        }
    }

    /// Attach the original cells
    pub fn with_raw(mut self, raw: Vec<CellValue>) -> Self {
        self.raw = raw;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == CANCELLED_STATUS
    }
}

/// The unified table produced by a load
#[derive(Debug, Clone, Default)]
pub struct FiscalTable {
    /// Union of every file's header, in first-seen order
    pub raw_columns: Vec<String>,
    pub records: Vec<Record>,
}

impl FiscalTable {
    pub fn new(raw_columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { raw_columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct codes, sorted
    pub fn codes(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.tax_operation_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct statuses, sorted
    pub fn statuses(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.status.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest emission date, ignoring undated rows
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.emission_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Earliest and latest month-year label
    pub fn period(&self) -> Option<(String, String)> {
        self.date_bounds()
            .map(|(lo, hi)| (month_year_label(lo), month_year_label(hi)))
    }
}
