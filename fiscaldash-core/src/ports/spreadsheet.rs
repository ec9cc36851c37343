//! Spreadsheet reader port
//!
//! Defines how a single workbook file becomes a header plus rows of raw
//! cells. The loader only talks to this trait, so tests can substitute an
//! in-memory reader.

use std::path::Path;

use crate::domain::result::Result;
use crate::domain::CellValue;

/// One parsed worksheet: a header and the data rows below it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Column names, unique within the sheet
    pub columns: Vec<String>,
    /// Data rows; each row has exactly `columns.len()` cells
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Build a sheet from a header row and data rows
    ///
    /// Blank header cells become `Unnamed: N`, repeated names get a `.N`
    /// suffix, rows are padded or truncated to the header width and fully
    /// blank rows are dropped.
    pub fn from_rows(header: Vec<CellValue>, data: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<String> = Vec::with_capacity(header.len());
        for (idx, cell) in header.iter().enumerate() {
            let base = if cell.is_blank() {
                format!("Unnamed: {}", idx)
            } else {
                cell.to_text()
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while columns.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            columns.push(name);
        }

        let width = columns.len();
        let rows = data
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Reads the first worksheet of a workbook file
pub trait SpreadsheetReader: Send + Sync {
    /// Parse a workbook; errors describe why the file is unreadable
    fn read(&self, path: &Path) -> Result<Sheet>;
}
