//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl Error {
    /// Create a spreadsheet error
    pub fn spreadsheet(msg: impl Into<String>) -> Self {
        Self::Spreadsheet(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result with context
    pub fn fail_with_context(
        error: impl Into<String>,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail_with_context() {
        let mut context = HashMap::new();
        context.insert("folder".to_string(), serde_json::json!("/tmp/none"));
        let result: OperationResult<i32> =
            OperationResult::fail_with_context("Folder not found", context);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error, Some("Folder not found".to_string()));
        assert!(result.context.unwrap().contains_key("folder"));
    }

    #[test]
    fn test_spreadsheet_error_message() {
        let err = Error::spreadsheet("corrupt workbook");
        assert_eq!(err.to_string(), "Spreadsheet error: corrupt workbook");
    }
}
