//! Conditions reported while loading a folder

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::field::SemanticField;

/// A load condition. None of these abort the process; fatal ones leave the
/// table empty and stop downstream rendering.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadIssue {
    #[error("Folder not found: {}", .folder.display())]
    DirectoryNotFound { folder: PathBuf },

    #[error("No Excel files (.xlsx/.xls) found in folder: {}", .folder.display())]
    NoFilesFound { folder: PathBuf },

    #[error("Failed to read {file}: {message}")]
    FileParseFailure { file: String, message: String },

    #[error("No data was loaded successfully")]
    NoDataLoaded,

    #[error(
        "{} column not found in the files. Using {}.",
        .field.label(),
        .field.fallback_label()
    )]
    MissingSemanticColumn { field: SemanticField },
}

impl LoadIssue {
    /// Fatal issues leave nothing to display
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoadIssue::DirectoryNotFound { .. }
                | LoadIssue::NoFilesFound { .. }
                | LoadIssue::NoDataLoaded
        )
    }

    /// Event name used in the event log
    pub fn event_name(&self) -> &'static str {
        match self {
            LoadIssue::FileParseFailure { .. } => "file_parse_failed",
            LoadIssue::MissingSemanticColumn { .. } => "column_missing",
            _ => "load_halted",
        }
    }
}
