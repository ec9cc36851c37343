//! Core domain entities
//!
//! Invoice records, the unified table, filters and load conditions. These
//! are pure data structures with validation logic - no I/O.

pub mod cell;
pub mod cfop;
mod field;
pub mod filter;
mod issue;
pub mod record;
pub mod result;

pub use cell::CellValue;
pub use field::{ColumnCandidates, SemanticField};
pub use filter::{DateRange, FilterCriteria, FilteredTable, Selection};
pub use issue::LoadIssue;
pub use record::{FiscalTable, Record};
