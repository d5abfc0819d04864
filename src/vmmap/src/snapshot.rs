//! Snapshot Manifest
//!
//! A snapshot directory is produced by a capture step: one raw capture image
//! plus a pagemap sidecar per process, tied together by `snapshot.json`:
//!
//! ```json
//! {
//!   "image": "capture.raw",
//!   "processes": [
//!     { "pid": 1234, "name": "init", "pagemap": "pid.1234.pagemap" }
//!   ]
//! }
//! ```

use crate::layer::{ImageLayer, LayerError, ProcessLayer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to open capture image: {0}")]
    Image(#[from] LayerError),
}

/// Manifest schema for `snapshot.json`.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    image: String,
    processes: Vec<ManifestProcess>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestProcess {
    pid: u32,
    name: String,
    pagemap: String,
}

/// One captured process: manifest data plus a handle to the capture image.
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pagemap: PathBuf,
    image: Arc<ImageLayer>,
}

impl ProcessEntry {
    /// Materialize this process's translation layer.
    ///
    /// Fails when the pagemap sidecar is unreadable, malformed, or describes
    /// an invalid address space; callers skip the process in that case.
    pub fn layer(&self) -> Result<ProcessLayer, LayerError> {
        ProcessLayer::open(self.pid, Arc::clone(&self.image), &self.pagemap)
    }

    pub fn pagemap(&self) -> &Path {
        &self.pagemap
    }
}

/// An opened snapshot: parsed manifest plus the memory-mapped capture image.
pub struct Snapshot {
    root: PathBuf,
    image: Arc<ImageLayer>,
    processes: Vec<ProcessEntry>,
}

impl Snapshot {
    /// Open a snapshot from its directory or from the manifest file itself.
    ///
    /// The image and pagemap paths in the manifest are resolved relative to
    /// the manifest's directory. The capture image is memory-mapped once and
    /// shared by every process layer.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let manifest_path = if path.is_dir() {
            path.join("snapshot.json")
        } else {
            path.to_path_buf()
        };
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let file = File::open(&manifest_path).map_err(|source| SnapshotError::Manifest {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| SnapshotError::Parse {
                path: manifest_path.clone(),
                source,
            })?;

        let image = Arc::new(ImageLayer::open(root.join(&manifest.image))?);
        let processes = manifest
            .processes
            .into_iter()
            .map(|p| ProcessEntry {
                pid: p.pid,
                name: p.name,
                pagemap: root.join(&p.pagemap),
                image: Arc::clone(&image),
            })
            .collect();

        Ok(Snapshot {
            root,
            image,
            processes,
        })
    }

    /// Captured processes, in manifest order.
    pub fn processes(&self) -> &[ProcessEntry] {
        &self.processes
    }

    pub fn image(&self) -> &ImageLayer {
        &self.image
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
