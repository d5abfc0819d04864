//! # vmmap
//!
//! Process memory map extraction from raw memory snapshots.
//!
//! A snapshot pairs a flat capture image with one pagemap sidecar per
//! process, describing how each virtual address space maps into the image.
//! This library provides functionality to:
//! - Open a snapshot and enumerate its captured processes
//! - Stream each process's mapped regions through a translation layer
//! - Coalesce adjacent regions into contiguous runs
//! - Extract the backing bytes into per-process dump files while emitting
//!   display-ready rows with file-offset bookkeeping
//!
//! ## Example
//!
//! ```no_run
//! use vmmap::{snapshot_rows, MapOptions, Snapshot};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = Snapshot::open("capture/")?;
//! let options = MapOptions {
//!     coalesce: true,
//!     ..MapOptions::default()
//! };
//!
//! for row in snapshot_rows(&snapshot, &options) {
//!     let row = row?;
//!     println!(
//!         "{:#x} -> {:#x} ({:#x} bytes)",
//!         row.virtual_offset, row.backing_offset, row.backing_size
//!     );
//! }
//! # Ok(())
//! # }
//! ```

pub mod coalesce;
pub mod extract;
pub mod layer;
pub mod snapshot;

// Re-export commonly used items
#[doc(inline)]
pub use coalesce::{coalesce, Coalesce, CoalescedRun};
#[doc(inline)]
pub use extract::{
    process_rows, snapshot_rows, ExtractError, MapOptions, OutputRow, ProcessRows, RowStatus,
    SnapshotRows,
};
#[doc(inline)]
pub use layer::{ImageLayer, LayerError, ProcessLayer, RegionDescriptor, TranslationLayer};
#[doc(inline)]
pub use snapshot::{ProcessEntry, Snapshot, SnapshotError};
