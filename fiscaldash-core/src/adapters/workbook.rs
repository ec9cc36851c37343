//! Spreadsheet reader backed by calamine (.xlsx and .xls)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::result::{Error, Result};
use crate::domain::CellValue;
use crate::ports::{Sheet, SpreadsheetReader};

/// Reads the first worksheet with its first row as header
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineReader;

impl CalamineReader {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetReader for CalamineReader {
    fn read(&self, path: &Path) -> Result<Sheet> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Error::spreadsheet(format!("cannot open workbook: {}", e)))?;

        let first_sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::spreadsheet("workbook has no worksheets"))?;

        let range = workbook.worksheet_range(&first_sheet).map_err(|e| {
            Error::spreadsheet(format!("cannot read sheet '{}': {}", first_sheet, e))
        })?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(to_cell).collect::<Vec<_>>());

        let header = match rows.next() {
            Some(header) => header,
            None => return Ok(Sheet::default()),
        };

        Ok(Sheet::from_rows(header, rows.collect()))
    }
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if !dt.is_duration() => CellValue::DateTime(value),
            _ => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = CalamineReader::new().read(&path).unwrap_err();
        assert!(err.to_string().contains("Spreadsheet error"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = CalamineReader::new().read(&dir.path().join("absent.xls"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_cell(&Data::Int(5102)), CellValue::Number(5102.0));
        assert_eq!(to_cell(&Data::String("x".into())), CellValue::Text("x".into()));
        assert_eq!(
            to_cell(&Data::DateTimeIso("2025-01-02".into())),
            CellValue::Text("2025-01-02".into())
        );
        assert_eq!(to_cell(&Data::Empty), CellValue::Empty);
    }
}
