//! Run history export: CSV, PNG chart, and JSON summary.

pub mod chart;
pub mod config;
pub mod csv;
pub mod statistics;
pub mod summary;

pub use config::ChartConfig;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::model::{IdealStats, StatSnapshot};

pub const HISTORY_CSV_NAME: &str = "stat_history.csv";
pub const GRAPH_NAME: &str = "stat_graph.png";
pub const SUMMARY_NAME: &str = "run_summary.json";

/// Inputs shared by every export format.
#[derive(Debug, Clone, Copy)]
pub struct RunRecord<'a> {
    pub trainee: &'a str,
    pub photo: Option<&'a Path>,
    pub ideal: &'a IdealStats,
    /// Confirmed snapshots, oldest first.
    pub history: &'a [StatSnapshot],
}

/// Which files to produce.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub csv: bool,
    pub graph: bool,
    pub summary: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            csv: true,
            graph: true,
            summary: true,
        }
    }
}

/// Write the selected exports into `dir`. Returns the files written.
pub fn export_run(
    record: &RunRecord,
    dir: &Path,
    options: ExportOptions,
    chart_config: &ChartConfig,
) -> Result<Vec<PathBuf>> {
    if record.history.is_empty() {
        bail!("nothing to export: the run has no confirmed stats yet");
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let mut written = Vec::new();

    if options.csv {
        let path = dir.join(HISTORY_CSV_NAME);
        csv::write_history_csv(&path, record.history)?;
        written.push(path);
    }

    if options.graph {
        let path = dir.join(GRAPH_NAME);
        chart::generate_stat_graph(
            record.trainee,
            record.history,
            record.ideal,
            &path,
            chart_config,
        )?;
        written.push(path);
    }

    if options.summary {
        let path = dir.join(SUMMARY_NAME);
        summary::export_to_json(&summary::RunSummary::from_record(record), &path)?;
        written.push(path);
    }

    for path in &written {
        crate::log(&format!("Exported {}", path.display()));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatMap;
    use tempfile::tempdir;

    #[test]
    fn test_export_csv_and_summary() {
        let dir = tempdir().unwrap();
        let history = vec![StatMap::new([100; 5]), StatMap::new([120, 100, 110, 100, 100])];
        let ideal = StatMap::new([600; 5]);
        let record = RunRecord {
            trainee: "Runner",
            photo: None,
            ideal: &ideal,
            history: &history,
        };
        let options = ExportOptions {
            graph: false,
            ..ExportOptions::default()
        };

        let out = dir.path().join("exports");
        let written = export_run(&record, &out, options, &ChartConfig::default()).unwrap();
        assert_eq!(written, vec![out.join(HISTORY_CSV_NAME), out.join(SUMMARY_NAME)]);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_empty_history_rejected() {
        let dir = tempdir().unwrap();
        let ideal = StatMap::new([600; 5]);
        let record = RunRecord {
            trainee: "Runner",
            photo: None,
            ideal: &ideal,
            history: &[],
        };
        assert!(export_run(&record, dir.path(), ExportOptions::default(), &ChartConfig::default()).is_err());
    }
}
