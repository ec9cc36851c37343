//! Loader service - folder scan, merge and normalization

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{CellValue, ColumnCandidates, FiscalTable, LoadIssue};
use crate::ports::{Sheet, SpreadsheetReader};
use crate::services::normalize::{normalize_row, ColumnChoice, ResolvedColumns};

/// Recognized workbook extensions, in discovery order
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Per-file result of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLoad {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileLoad {
    pub fn is_loaded(&self) -> bool {
        self.rows.is_some()
    }
}

/// Everything a single load produced
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub folder: PathBuf,
    pub files: Vec<FileLoad>,
    pub issues: Vec<LoadIssue>,
    pub columns: Vec<ColumnChoice>,
    pub table: FiscalTable,
    pub loaded_at: DateTime<Local>,
}

impl LoadOutcome {
    fn halted(
        folder: &Path,
        files: Vec<FileLoad>,
        mut issues: Vec<LoadIssue>,
        fatal: LoadIssue,
    ) -> Self {
        issues.push(fatal);
        Self {
            folder: folder.to_path_buf(),
            files,
            issues,
            columns: Vec::new(),
            table: FiscalTable::default(),
            loaded_at: Local::now(),
        }
    }

    /// True when a fatal issue left nothing to display
    pub fn is_halted(&self) -> bool {
        self.issues.iter().any(LoadIssue::is_fatal)
    }

    pub fn files_loaded(&self) -> usize {
        self.files.iter().filter(|f| f.is_loaded()).count()
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            folder: self.folder.to_string_lossy().to_string(),
            files_found: self.files.len(),
            files_loaded: self.files_loaded(),
            total_records: self.table.len(),
            period: self.table.period(),
            files: self.files.clone(),
            columns: self.columns.clone(),
            issues: self.issues.clone(),
            loaded_at: self.loaded_at.to_rfc3339(),
        }
    }
}

/// Serializable summary of a load (for JSON output)
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub folder: String,
    pub files_found: usize,
    pub files_loaded: usize,
    pub total_records: usize,
    pub period: Option<(String, String)>,
    pub files: Vec<FileLoad>,
    pub columns: Vec<ColumnChoice>,
    pub issues: Vec<LoadIssue>,
    pub loaded_at: String,
}

/// Loader service: builds the unified table from a folder of workbooks
pub struct LoaderService {
    reader: Arc<dyn SpreadsheetReader>,
    candidates: ColumnCandidates,
}

impl LoaderService {
    pub fn new(reader: Arc<dyn SpreadsheetReader>, candidates: ColumnCandidates) -> Self {
        Self { reader, candidates }
    }

    /// Load every recognized workbook in `folder`
    ///
    /// Never fails: unreadable files are skipped and reported, and fatal
    /// conditions produce an empty table carrying the issue.
    pub fn load(&self, folder: &Path) -> LoadOutcome {
        let paths = match discover_files(folder) {
            Ok(paths) => paths,
            Err(issue) => return LoadOutcome::halted(folder, Vec::new(), Vec::new(), issue),
        };

        let mut files = Vec::with_capacity(paths.len());
        let mut issues = Vec::new();
        let mut sheets: Vec<(String, Sheet)> = Vec::new();

        for path in &paths {
            let file = file_name(path);
            match self.reader.read(path) {
                Ok(sheet) => {
                    files.push(FileLoad {
                        file: file.clone(),
                        rows: Some(sheet.row_count()),
                        error: None,
                    });
                    sheets.push((file, sheet));
                }
                Err(e) => {
                    let message = e.to_string();
                    files.push(FileLoad {
                        file: file.clone(),
                        rows: None,
                        error: Some(message.clone()),
                    });
                    issues.push(LoadIssue::FileParseFailure { file, message });
                }
            }
        }

        if sheets.is_empty() {
            return LoadOutcome::halted(folder, files, issues, LoadIssue::NoDataLoaded);
        }

        let raw_columns = union_columns(&sheets);
        let resolved = ResolvedColumns::resolve(&self.candidates, &raw_columns);
        issues.extend(
            resolved
                .missing()
                .into_iter()
                .map(|field| LoadIssue::MissingSemanticColumn { field }),
        );

        let mut records = Vec::with_capacity(sheets.iter().map(|(_, s)| s.row_count()).sum());
        for (file, sheet) in sheets {
            let positions: Vec<usize> = sheet
                .columns
                .iter()
                .map(|c| raw_columns.iter().position(|u| u == c).unwrap_or_default())
                .collect();

            for row in sheet.rows {
                let mut merged = vec![CellValue::Empty; raw_columns.len()];
                for (cell, &pos) in row.into_iter().zip(&positions) {
                    merged[pos] = cell;
                }
                records.push(normalize_row(&file, merged, &resolved));
            }
        }

        LoadOutcome {
            folder: folder.to_path_buf(),
            files,
            issues,
            columns: resolved.describe(&raw_columns),
            table: FiscalTable::new(raw_columns, records),
            loaded_at: Local::now(),
        }
    }
}

/// List recognized workbooks at the top level of `folder`
///
/// `.xlsx` files come first, then `.xls`, each group sorted by file name.
/// Extensions match case-insensitively; subdirectories are not scanned.
pub fn discover_files(folder: &Path) -> Result<Vec<PathBuf>, LoadIssue> {
    let not_found = || LoadIssue::DirectoryNotFound { folder: folder.to_path_buf() };

    if !folder.is_dir() {
        return Err(not_found());
    }
    let entries = std::fs::read_dir(folder).map_err(|_| not_found())?;

    let mut found: Vec<(usize, String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            let rank = SPREADSHEET_EXTENSIONS.iter().position(|e| *e == ext)?;
            Some((rank, file_name(&path), path))
        })
        .collect();

    if found.is_empty() {
        return Err(LoadIssue::NoFilesFound { folder: folder.to_path_buf() });
    }

    found.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Ok(found.into_iter().map(|(_, _, path)| path).collect())
}

fn union_columns(sheets: &[(String, Sheet)]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (_, sheet) in sheets {
        for column in &sheet.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_discovery_orders_xlsx_before_xls() {
        let dir = tempdir().unwrap();
        for name in ["b.xls", "b.xlsx", "a.XLSX", "a.xls", "notes.txt", "c.csv"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("nested.xlsx")).unwrap();

        let names: Vec<String> = discover_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a.XLSX", "b.xlsx", "a.xls", "b.xls"]);
    }

    #[test]
    fn test_discovery_is_not_recursive() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("2024");
        std::fs::create_dir(&sub).unwrap();
        touch(&sub, "old.xlsx");

        let issue = discover_files(dir.path()).unwrap_err();
        assert!(matches!(issue, LoadIssue::NoFilesFound { .. }));
    }

    #[test]
    fn test_discovery_missing_folder() {
        let dir = tempdir().unwrap();
        let issue = discover_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(issue, LoadIssue::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let sheet = |cols: &[&str]| Sheet {
            columns: cols.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        };
        let sheets = vec![
            ("a".to_string(), sheet(&["CFOP", "ICMS"])),
            ("b".to_string(), sheet(&["Data", "CFOP", "Status"])),
        ];
        assert_eq!(union_columns(&sheets), vec!["CFOP", "ICMS", "Data", "Status"]);
    }
}
