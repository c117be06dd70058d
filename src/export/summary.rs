//! JSON run summary.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::statistics::{calculate_run_stats, StatStats};
use super::RunRecord;
use crate::model::{IdealStats, StatSnapshot};

/// Everything worth keeping about a finished (or abandoned) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub trainee: String,
    pub photo: Option<String>,
    pub exported_at: String,
    /// Number of confirmed snapshots
    pub turns: usize,
    pub ideal: IdealStats,
    #[serde(rename = "final")]
    pub final_stats: Option<StatSnapshot>,
    pub stats: Vec<StatStats>,
}

impl RunSummary {
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            trainee: record.trainee.to_string(),
            photo: record.photo.map(|p| p.display().to_string()),
            exported_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            turns: record.history.len(),
            ideal: *record.ideal,
            final_stats: record.history.last().copied(),
            stats: calculate_run_stats(record.history, record.ideal),
        }
    }
}

/// Export the summary to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(summary: &RunSummary, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(summary).context("Failed to serialize run summary to JSON")?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}
