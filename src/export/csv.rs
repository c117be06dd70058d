//! CSV export of the confirmed stat history.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::StatSnapshot;

/// CSV header row. Turn numbers count confirmed snapshots from 1.
pub const CSV_HEADER: &str = "Turn,speed,stamina,power,guts,wit";

/// Writes one row per snapshot, replacing any existing file.
pub fn write_history_csv(path: &Path, history: &[StatSnapshot]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    for (i, snapshot) in history.iter().enumerate() {
        let v = snapshot.values();
        writeln!(out, "{},{},{},{},{},{}", i + 1, v[0], v[1], v[2], v[3], v[4])
            .context("Failed to write CSV row")?;
    }
    out.flush().context("Failed to flush CSV file")?;
    Ok(())
}
