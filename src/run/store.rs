//! Saved-run persistence (`run_state.json`).

use anyhow::Result;
use std::path::PathBuf;

use super::state::RunState;
use crate::storage;

/// Location of the single saved run.
#[derive(Debug, Clone)]
pub struct RunStore {
    path: PathBuf,
}

impl RunStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default data-directory location.
    pub fn open_default() -> Self {
        Self::new(crate::paths::get_run_state_file())
    }

    /// The saved run, or `None` if no run is in progress.
    pub fn load(&self) -> Result<Option<RunState>> {
        storage::read_json(&self.path)
    }

    pub fn save(&self, run: &RunState) -> Result<()> {
        storage::write_json(&self.path, run)?;
        crate::log(&format!("Saved run state to {}", self.path.display()));
        Ok(())
    }

    /// Delete the saved run. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        let removed = storage::remove_file(&self.path)?;
        if removed {
            crate::log("Cleared saved run state");
        }
        Ok(removed)
    }
}
