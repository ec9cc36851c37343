//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case: loading a folder, building reports,
//! exporting, and event logging.

mod cache;
pub mod export;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod report;

pub use cache::LoadCache;
pub use export::{export_file_name, ExportResult, ExportService};
pub use loader::{discover_files, FileLoad, LoadOutcome, LoadSummary, LoaderService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use normalize::{ColumnChoice, ResolvedColumns};
pub use report::{
    CodeStatusPivot, CodeTotal, MonthlyPoint, PivotRow, Report, ReportService, StatusCount,
    StatusHeatmap, SummaryMetrics,
};
