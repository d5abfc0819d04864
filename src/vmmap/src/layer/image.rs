//! Capture Image Layer
//!
//! The lower-level backing layer: a flat capture image, memory-mapped and
//! addressed by file offset.

use super::{LayerError, RegionDescriptor, TranslationLayer};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Memory-mapped capture image.
///
/// Offsets into this layer are file offsets; the mapping is the identity.
#[derive(Debug)]
pub struct ImageLayer {
    mmap: Mmap,
    name: String,
    path: PathBuf,
}

impl ImageLayer {
    /// Memory-map a capture image. The layer name is the file stem.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LayerError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(ImageLayer { mmap, name, path })
    }

    /// Size of the image in bytes.
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranslationLayer for ImageLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn maximum_address(&self) -> u64 {
        self.len().saturating_sub(1)
    }

    fn mapping(
        &self,
        offset: u64,
        length: u64,
        ignore_errors: bool,
    ) -> Result<Vec<RegionDescriptor>, LayerError> {
        let end = offset.saturating_add(length).min(self.len());
        if offset >= end {
            if length > 0 && offset >= self.len() && !ignore_errors {
                return Err(LayerError::invalid_address(&self.name, offset));
            }
            return Ok(Vec::new());
        }

        Ok(vec![RegionDescriptor {
            virtual_offset: offset,
            virtual_size: end - offset,
            backing_offset: offset,
            backing_size: end - offset,
            backing_layer: self.name.clone(),
        }])
    }

    fn read(&self, offset: u64, length: u64, pad: bool) -> Result<Vec<u8>, LayerError> {
        let end = offset.saturating_add(length);
        if end > self.len() && !pad {
            // First unreadable byte: either the requested offset itself or
            // the end of the image.
            let first_invalid = offset.max(self.len());
            return Err(LayerError::invalid_address(&self.name, first_invalid));
        }

        let mut data = vec![0u8; length as usize];
        let available_end = end.min(self.len());
        if offset < available_end {
            let start = offset as usize;
            let avail = (available_end - offset) as usize;
            data[..avail].copy_from_slice(&self.mmap[start..start + avail]);
        }
        Ok(data)
    }
}
