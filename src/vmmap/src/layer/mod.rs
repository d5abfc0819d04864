//! Translation Layers
//!
//! Address-space views stacked over a capture image:
//! - `ImageLayer`: the raw capture image itself, addressed by file offset
//! - `ProcessLayer`: one process's virtual address space, translated through
//!   its pagemap sidecar
//! - A mock layer for extractor tests

mod image;
#[cfg(test)]
pub(crate) mod mock;
mod process;
mod region;
mod traits;

pub use image::ImageLayer;
pub use process::ProcessLayer;
pub use region::RegionDescriptor;
pub use traits::{LayerError, TranslationLayer};
