//! FiscalDash Core - Business logic for the outgoing-invoice dashboard
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Record, FiscalTable, FilterCriteria, LoadIssue)
//! - **ports**: Trait definitions for external dependencies (SpreadsheetReader)
//! - **services**: Business logic orchestration (load, report, export, logging)
//! - **adapters**: Concrete implementations (calamine workbooks)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod log_migrations;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::CalamineReader;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    CellValue, DateRange, FilterCriteria, FilteredTable, FiscalTable, LoadIssue, Record,
    Selection, SemanticField,
};
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LoadCache, LoadOutcome, LogEvent, LoggingService, Report};

/// Main context for dashboard operations
///
/// Holds the configuration and the services wired to the real workbook
/// reader. Interactive callers keep a [`LoadCache`] next to it.
pub struct DashboardContext {
    pub config: Config,
    pub app_dir: PathBuf,
    pub loader_service: LoaderService,
    pub report_service: ReportService,
    pub export_service: ExportService,
}

impl DashboardContext {
    /// Create a context from the settings in `app_dir`
    pub fn new(app_dir: &Path) -> Result<Self> {
        let config = Config::load(app_dir)?;
        Ok(Self::with_config(app_dir, config))
    }

    /// Create a context from an already loaded configuration
    pub fn with_config(app_dir: &Path, config: Config) -> Self {
        let loader_service =
            LoaderService::new(Arc::new(CalamineReader::new()), config.column_candidates());
        let report_service = ReportService::new(config.top_codes);

        Self {
            config,
            app_dir: app_dir.to_path_buf(),
            loader_service,
            report_service,
            export_service: ExportService::new(),
        }
    }

    /// Load `folder` without caching
    pub fn load(&self, folder: &Path) -> LoadOutcome {
        self.loader_service.load(folder)
    }

    /// Load `folder` through `cache`
    pub fn load_cached(
        &self,
        cache: &mut LoadCache,
        folder: &Path,
        force_reload: bool,
    ) -> Arc<LoadOutcome> {
        cache.load(&self.loader_service, folder, force_reload)
    }

    /// Filter the loaded table and build every report view
    pub fn report(&self, table: &FiscalTable, criteria: &FilterCriteria) -> Report {
        self.report_service.build(&criteria.apply(table))
    }
}
