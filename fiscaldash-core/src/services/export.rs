//! Export service - CSV download of the filtered table

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{FilteredTable, Record};

/// File name prefix of exports
pub const EXPORT_FILE_PREFIX: &str = "dados_fiscais_filtrados";

/// Normalized columns appended after the raw ones. Raw columns with the same
/// name are replaced by these.
pub const NORMALIZED_COLUMNS: [&str; 9] = [
    "Arquivo_Origem",
    "Data de emissão atualizada",
    "Mês",
    "Ano",
    "Mês/Ano",
    "CFOP",
    "Descrição CFOP",
    "Situação",
    "Valor de ICMS",
];

/// `dados_fiscais_filtrados_YYYYMMDD_HHMM.csv`
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("{}_{}.csv", EXPORT_FILE_PREFIX, now.format("%Y%m%d_%H%M"))
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Export service for CSV output
#[derive(Debug, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Header row of an export
    pub fn header(&self, filtered: &FilteredTable<'_>) -> Vec<String> {
        kept_raw_columns(filtered.raw_columns)
            .into_iter()
            .map(|(_, name)| name.to_string())
            .chain(NORMALIZED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Write the filtered table as CSV; returns the number of data rows
    pub fn write_csv<W: Write>(&self, filtered: &FilteredTable<'_>, writer: W) -> Result<usize> {
        let kept = kept_raw_columns(filtered.raw_columns);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(self.header(filtered))
            .context("Failed to write CSV header")?;

        for record in &filtered.records {
            let mut row: Vec<String> = kept
                .iter()
                .map(|(idx, _)| record.raw.get(*idx).map(|c| c.to_text()).unwrap_or_default())
                .collect();
            row.extend(normalized_values(record));
            csv_writer.write_record(&row).context("Failed to write CSV row")?;
        }

        csv_writer.flush().context("Failed to flush CSV output")?;
        Ok(filtered.len())
    }

    /// Write the filtered table to `path`
    pub fn export_to_file(
        &self,
        filtered: &FilteredTable<'_>,
        path: &Path,
    ) -> Result<ExportResult> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        let rows = self.write_csv(filtered, file)?;

        Ok(ExportResult {
            path: path.to_path_buf(),
            rows,
            columns: self.header(filtered).len(),
        })
    }

    /// Write the filtered table into `dir` under a timestamped name
    pub fn export_to_dir(
        &self,
        filtered: &FilteredTable<'_>,
        dir: &Path,
        now: NaiveDateTime,
    ) -> Result<ExportResult> {
        self.export_to_file(filtered, &dir.join(export_file_name(now)))
    }
}

fn kept_raw_columns(raw_columns: &[String]) -> Vec<(usize, &str)> {
    raw_columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !NORMALIZED_COLUMNS.contains(&name.as_str()))
        .map(|(idx, name)| (idx, name.as_str()))
        .collect()
}

fn normalized_values(record: &Record) -> Vec<String> {
    let optional = |value: Option<String>| value.unwrap_or_default();
    vec![
        record.source_file.clone(),
        optional(record.emission_date.map(|d| d.format("%Y-%m-%d").to_string())),
        optional(record.month.map(|m| m.to_string())),
        optional(record.year.map(|y| y.to_string())),
        optional(record.month_year_label.clone()),
        record.tax_operation_code.clone(),
        record.tax_operation_description.clone(),
        record.status.clone(),
        record.tax_value.normalize().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, FilterCriteria, FiscalTable, Selection};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> FiscalTable {
        let columns = vec!["Nota".to_string(), "CFOP".to_string(), "Cliente".to_string()];
        let date = NaiveDate::from_ymd_opt(2025, 4, 2);
        FiscalTable::new(
            columns,
            vec![
                Record::new("a.xlsx", date, "5102", "Cancelada", dec("10.50")).with_raw(vec![
                    CellValue::Number(1001.0),
                    CellValue::Number(5102.0),
                    CellValue::Text("Loja, Centro".to_string()),
                ]),
                Record::new("b.xlsx", None, "9999", "Emitida DANFE", Decimal::ZERO)
                    .with_raw(vec![CellValue::Number(1002.0), CellValue::Text("9999".to_string())]),
            ],
        )
    }

    #[test]
    fn test_export_file_name_has_timestamp() {
        let now = NaiveDate::from_ymd_opt(2025, 7, 4)
            .unwrap()
            .and_hms_opt(9, 5, 59)
            .unwrap();
        assert_eq!(export_file_name(now), "dados_fiscais_filtrados_20250704_0905.csv");
    }

    #[test]
    fn test_csv_replaces_colliding_raw_columns_and_quotes() {
        let table = table();
        let filtered = FilterCriteria::default().apply(&table);

        let mut buffer = Vec::new();
        let rows = ExportService::new().write_csv(&filtered, &mut buffer).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Nota,Cliente,Arquivo_Origem,Data de emissão atualizada,Mês,Ano,Mês/Ano,CFOP,Descrição CFOP,Situação,Valor de ICMS"
        );
        assert_eq!(
            lines[1],
            "1001,\"Loja, Centro\",a.xlsx,2025-04-02,4,2025,2025-04,5102,Venda de mercadorias,Cancelada,10.5"
        );
        assert_eq!(lines[2], "1002,,b.xlsx,,,,,9999,Other,Emitida DANFE,0");
    }

    #[test]
    fn test_export_only_filtered_rows() {
        let table = table();
        let criteria = FilterCriteria {
            code: Selection::Only("9999".to_string()),
            ..Default::default()
        };
        let filtered = criteria.apply(&table);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let result = ExportService::new().export_to_file(&filtered, &path).unwrap();
        assert_eq!(result.rows, 1);
        assert_eq!(result.columns, 11);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 1);
    }
}
