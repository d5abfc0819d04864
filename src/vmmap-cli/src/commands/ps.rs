//! Process listing command handler

use anyhow::{Context, Result};
use std::path::Path;
use vmmap::Snapshot;

/// Handle the Ps command
///
/// Lists the processes captured in a snapshot with their mapping totals. A
/// process whose pagemap cannot be materialized is shown as unavailable
/// rather than hiding it.
pub fn handle(snapshot_path: &Path) -> Result<()> {
    let snapshot = Snapshot::open(snapshot_path)
        .with_context(|| format!("Failed to open snapshot {}", snapshot_path.display()))?;

    println!(
        "Snapshot {} ({} processes, image {:#x} bytes)\n",
        snapshot.root().display(),
        snapshot.processes().len(),
        snapshot.image().len()
    );
    println!("{:>8}  {:<20} {:>8} {:>14}", "PID", "Name", "Regions", "Mapped");

    for entry in snapshot.processes() {
        match entry.layer() {
            Ok(layer) => println!(
                "{:>8}  {:<20} {:>8} {:>#14x}",
                entry.pid,
                entry.name,
                layer.region_count(),
                layer.mapped_bytes()
            ),
            Err(err) => println!(
                "{:>8}  {:<20} {:>8} {:>14}  ({err})",
                entry.pid, entry.name, "-", "-"
            ),
        }
    }

    Ok(())
}
