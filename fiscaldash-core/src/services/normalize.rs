//! Column resolution and per-cell coercion
//!
//! Turns merged raw rows into [`Record`]s. Every coercion is row-lenient:
//! a bad cell degrades to a missing date or a zero value, never an error.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::cfop::UNIDENTIFIED_CODE;
use crate::domain::record::{default_emission_date, DEFAULT_STATUS};
use crate::domain::{CellValue, ColumnCandidates, Record, SemanticField};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Largest Excel serial day (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Tax values above this are treated as unparseable
const MAX_TAX_VALUE: i64 = 1_000_000_000_000_000;

/// `1.234,56` or `10,5`
static COMMA_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d{1,3}(\.\d{3})+|\d+)(,\d+)?$").unwrap());

/// Position of each semantic field in the merged column list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub emission_date: Option<usize>,
    pub tax_operation_code: Option<usize>,
    pub status: Option<usize>,
    pub tax_value: Option<usize>,
}

impl ResolvedColumns {
    /// Resolve every field against the merged column list
    pub fn resolve(candidates: &ColumnCandidates, columns: &[String]) -> Self {
        let index_of = |field: SemanticField| {
            candidates
                .resolve(field, columns)
                .and_then(|name| columns.iter().position(|c| c == name))
        };

        Self {
            emission_date: index_of(SemanticField::EmissionDate),
            tax_operation_code: index_of(SemanticField::TaxOperationCode),
            status: index_of(SemanticField::Status),
            tax_value: index_of(SemanticField::TaxValue),
        }
    }

    pub fn get(&self, field: SemanticField) -> Option<usize> {
        match field {
            SemanticField::EmissionDate => self.emission_date,
            SemanticField::TaxOperationCode => self.tax_operation_code,
            SemanticField::Status => self.status,
            SemanticField::TaxValue => self.tax_value,
        }
    }

    /// Fields with no matching column, in resolution order
    pub fn missing(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    /// Column names chosen per field, for reporting
    pub fn describe(&self, columns: &[String]) -> Vec<ColumnChoice> {
        SemanticField::ALL
            .into_iter()
            .map(|field| ColumnChoice {
                field,
                column: self.get(field).and_then(|idx| columns.get(idx).cloned()),
            })
            .collect()
    }
}

/// The column a field was read from, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnChoice {
    pub field: SemanticField,
    pub column: Option<String>,
}

/// Build a record from one merged row
pub fn normalize_row(source_file: &str, raw: Vec<CellValue>, columns: &ResolvedColumns) -> Record {
    let cell = |idx: Option<usize>| idx.and_then(|i| raw.get(i));

    let emission_date = match columns.emission_date {
        Some(idx) => raw.get(idx).and_then(parse_date),
        None => Some(default_emission_date()),
    };
    let code = cell(columns.tax_operation_code)
        .map(parse_code)
        .unwrap_or_else(|| UNIDENTIFIED_CODE.to_string());
    let status = cell(columns.status)
        .map(parse_status)
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());
    let tax_value = cell(columns.tax_value)
        .map(parse_tax_value)
        .unwrap_or(Decimal::ZERO);

    Record::new(source_file, emission_date, code, status, tax_value).with_raw(raw)
}

/// Parse a date cell; unparseable values are `None`
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(serial) => excel_serial_to_date(*serial),
        CellValue::Text(text) => parse_date_text(text.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Blank codes become the unidentified sentinel
pub fn parse_code(cell: &CellValue) -> String {
    if cell.is_blank() {
        return UNIDENTIFIED_CODE.to_string();
    }
    cell.to_text().trim().to_string()
}

/// Blank statuses become the default status
pub fn parse_status(cell: &CellValue) -> String {
    if cell.is_blank() {
        return DEFAULT_STATUS.to_string();
    }
    cell.to_text().trim().to_string()
}

/// Parse a tax value; anything non-numeric, negative or implausibly large is zero
pub fn parse_tax_value(cell: &CellValue) -> Decimal {
    let value = match cell {
        CellValue::Number(n) => Decimal::from_f64(*n),
        CellValue::Text(text) => parse_decimal_text(text),
        _ => None,
    };
    let ceiling = Decimal::from(MAX_TAX_VALUE);
    value
        .filter(|v| *v > Decimal::ZERO && *v <= ceiling)
        .unwrap_or(Decimal::ZERO)
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = Decimal::from_str(text) {
        return Some(value);
    }
    if let Ok(value) = Decimal::from_scientific(text) {
        return Some(value);
    }
    if COMMA_DECIMAL.is_match(text) {
        let normalized = text.replace('.', "").replace(',', ".");
        return Decimal::from_str(&normalized).ok();
    }
    None
}
