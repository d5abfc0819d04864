//! Process Map Extraction
//!
//! Drives region enumeration per process, optional byte extraction into a
//! per-process dump file, and row emission with file-offset bookkeeping.
//!
//! Rows stream lazily and processes run strictly sequentially: no row for
//! the next process is computed before the current process's rows have been
//! consumed or abandoned. Dropping a row stream mid-process closes its dump
//! file.

use crate::coalesce::{coalesce, Coalesce, CoalescedRun};
use crate::layer::{LayerError, ProcessLayer, RegionDescriptor, TranslationLayer};
use crate::snapshot::{ProcessEntry, Snapshot};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::slice;
use std::vec;
use thiserror::Error;

/// Errors that abort a process's row production outright.
///
/// Address-validity conditions never surface here; they are recovered at the
/// narrowest scope (a skipped process or an error-status row).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to create dump file {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        source: io::Error,
    },

    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Options recognized by the map extractor.
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Merge contiguous runs before emission.
    pub coalesce: bool,
    /// Extract each run's bytes to a per-process dump file.
    pub dump: bool,
    /// Restrict output to one process id.
    pub pid: Option<u32>,
    /// Directory dump files are created in.
    pub output_dir: PathBuf,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions {
            coalesce: false,
            dump: false,
            pid: None,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Where a row's bytes went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// Dump mode off; no bytes were extracted.
    Disabled,
    /// Bytes appended to the named dump file.
    Written(PathBuf),
    /// The read failed; the dump file has a hole at this row's offset.
    Error,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Disabled => f.write_str("Disabled"),
            RowStatus::Written(path) => write!(f, "{}", path.display()),
            RowStatus::Error => f.write_str("Error outputting to file"),
        }
    }
}

/// One display-ready row per (coalesced) run.
///
/// Rows appear in region-stream order; `file_offset` is the run's position
/// in the dump file, valid even for rows whose read failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub virtual_offset: u64,
    pub backing_offset: u64,
    pub backing_size: u64,
    pub file_offset: u64,
    pub status: RowStatus,
}

/// Per-process dump stream, or nothing at all when dumping is off.
///
/// Both arms release on drop, keeping the emission loop uniform. The
/// `Disabled` arm guarantees no file is ever created.
enum OutputSink {
    Disabled,
    Active {
        file: BufWriter<File>,
        path: PathBuf,
    },
}

impl OutputSink {
    fn create(dump: bool, dir: &Path, pid: u32) -> Result<Self, ExtractError> {
        if !dump {
            return Ok(OutputSink::Disabled);
        }
        let path = dir.join(format!("pid.{pid}.dmp"));
        let file = File::create(&path).map_err(|source| ExtractError::Sink {
            path: path.clone(),
            source,
        })?;
        Ok(OutputSink::Active {
            file: BufWriter::new(file),
            path,
        })
    }
}

/// Either the coalescing transform or a one-to-one pass-through.
enum Runs<I> {
    Coalesced(Coalesce<I>),
    Direct(I),
}

impl<I> Iterator for Runs<I>
where
    I: Iterator<Item = RegionDescriptor>,
{
    type Item = CoalescedRun;

    fn next(&mut self) -> Option<CoalescedRun> {
        match self {
            Runs::Coalesced(runs) => runs.next(),
            Runs::Direct(regions) => regions.next().map(CoalescedRun::from),
        }
    }
}

/// Lazy row stream for one process.
pub struct ProcessRows<L> {
    layer: L,
    runs: Runs<vec::IntoIter<RegionDescriptor>>,
    sink: OutputSink,
    file_offset: u64,
}

/// Enumerate `layer`'s full address range and prepare the row stream for one
/// process.
///
/// Unmapped holes are skipped during enumeration. The dump file is created
/// up front when dumping is enabled; creation failure is fatal for this
/// process's extraction and is never masked.
pub fn process_rows<L: TranslationLayer>(
    layer: L,
    pid: u32,
    options: &MapOptions,
) -> Result<ProcessRows<L>, ExtractError> {
    let span = layer.maximum_address().saturating_add(1);
    let regions = layer.mapping(0, span, true)?;
    let sink = OutputSink::create(options.dump, &options.output_dir, pid)?;
    let runs = if options.coalesce {
        Runs::Coalesced(coalesce(regions))
    } else {
        Runs::Direct(regions.into_iter())
    };

    Ok(ProcessRows {
        layer,
        runs,
        sink,
        file_offset: 0,
    })
}

impl<L: TranslationLayer> ProcessRows<L> {
    fn extract(&mut self, run: &CoalescedRun) -> RowStatus {
        let OutputSink::Active { file, path } = &mut self.sink else {
            return RowStatus::Disabled;
        };

        let data = match self.layer.read(run.virtual_offset, run.virtual_size, true) {
            Ok(data) => data,
            Err(err) => {
                debug!(
                    "unable to write {} address {:#x} to {}: {err}",
                    self.layer.name(),
                    run.virtual_offset,
                    path.display()
                );
                return RowStatus::Error;
            }
        };

        match file.write_all(&data) {
            Ok(()) => RowStatus::Written(path.clone()),
            Err(err) => {
                debug!(
                    "unable to write {} bytes at {:#x} to {}: {err}",
                    data.len(),
                    run.virtual_offset,
                    path.display()
                );
                RowStatus::Error
            }
        }
    }
}

impl<L: TranslationLayer> Iterator for ProcessRows<L> {
    type Item = OutputRow;

    fn next(&mut self) -> Option<OutputRow> {
        let run = self.runs.next()?;
        let status = self.extract(&run);

        let row = OutputRow {
            virtual_offset: run.virtual_offset,
            backing_offset: run.backing_offset,
            backing_size: run.backing_size,
            file_offset: self.file_offset,
            status,
        };

        // File positions track the logical region layout, not bytes
        // written: a failed read leaves a hole and later offsets stay
        // mappable back to virtual addresses.
        self.file_offset += run.backing_size;
        Some(row)
    }
}

/// Row stream across every (filtered) process in a snapshot.
pub struct SnapshotRows<'a> {
    options: &'a MapOptions,
    processes: slice::Iter<'a, ProcessEntry>,
    current: Option<ProcessRows<ProcessLayer>>,
}

/// Stream output rows for all processes in `snapshot`, strictly in manifest
/// order.
///
/// A process whose translation layer cannot be materialized is logged at
/// debug level and contributes zero rows; the pass continues. Dump-file
/// creation failures surface as `Err` items.
pub fn snapshot_rows<'a>(snapshot: &'a Snapshot, options: &'a MapOptions) -> SnapshotRows<'a> {
    SnapshotRows {
        options,
        processes: snapshot.processes().iter(),
        current: None,
    }
}

impl Iterator for SnapshotRows<'_> {
    type Item = Result<OutputRow, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rows) = &mut self.current {
                match rows.next() {
                    Some(row) => return Some(Ok(row)),
                    None => self.current = None,
                }
            }

            let entry = self.processes.next()?;
            if self.options.pid.is_some_and(|pid| pid != entry.pid) {
                continue;
            }

            let layer = match entry.layer() {
                Ok(layer) => layer,
                Err(err) => {
                    debug!("process {}: {err}", entry.pid);
                    continue;
                }
            };

            match process_rows(layer, entry.pid, self.options) {
                Ok(rows) => self.current = Some(rows),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
