//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - calamine for the SpreadsheetReader port (.xlsx and .xls workbooks)

pub mod workbook;

pub use workbook::CalamineReader;
