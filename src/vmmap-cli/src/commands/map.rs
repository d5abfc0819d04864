//! Memory map command handler

use crate::config::Config;
use crate::render::TableWriter;
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use vmmap::{snapshot_rows, MapOptions, Snapshot};

/// Handle the Map command
///
/// Streams one row per (coalesced) run across all filtered processes.
/// Per-process and per-row failures are reported through row status and
/// debug logs; they do not affect the exit status.
pub fn handle(
    snapshot_path: &Path,
    pid: Option<u32>,
    coalesce: bool,
    dump: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let snapshot = Snapshot::open(snapshot_path)
        .with_context(|| format!("Failed to open snapshot {}", snapshot_path.display()))?;

    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => Config::load()?
            .output_dir
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let options = MapOptions {
        coalesce,
        dump,
        pid,
        output_dir,
    };

    let stdout = io::stdout().lock();
    let mut table = TableWriter::new(stdout);
    table.header()?;
    for row in snapshot_rows(&snapshot, &options) {
        let row = row.context("Extraction aborted")?;
        table.row(&row)?;
    }

    Ok(())
}
