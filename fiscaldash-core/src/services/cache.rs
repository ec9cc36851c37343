//! Load cache - memoizes load outcomes per folder path
//!
//! The cache is owned by the caller (typically an interactive session) and
//! passed into each load, so there is no hidden process-wide state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{LoadOutcome, LoaderService};

/// Map from folder path to the outcome of its last load
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<PathBuf, Arc<LoadOutcome>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome for a folder, if any
    pub fn get(&self, folder: &Path) -> Option<Arc<LoadOutcome>> {
        self.entries.get(folder).cloned()
    }

    /// Return the cached outcome, loading the folder on a miss
    ///
    /// `force_reload` rescans the folder and replaces the entry.
    pub fn load(
        &mut self,
        loader: &LoaderService,
        folder: &Path,
        force_reload: bool,
    ) -> Arc<LoadOutcome> {
        if !force_reload {
            if let Some(outcome) = self.entries.get(folder) {
                return Arc::clone(outcome);
            }
        }

        let outcome = Arc::new(loader.load(folder));
        self.entries.insert(folder.to_path_buf(), Arc::clone(&outcome));
        outcome
    }

    /// Drop the entry for a folder; returns whether one existed
    pub fn invalidate(&mut self, folder: &Path) -> bool {
        self.entries.remove(folder).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
