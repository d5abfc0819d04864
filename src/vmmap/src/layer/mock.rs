//! Mock Translation Layer
//!
//! A scripted layer for extractor tests: fixed region table, deterministic
//! byte pattern, per-offset read-failure injection.

use super::{LayerError, RegionDescriptor, TranslationLayer};

pub struct MockLayer {
    pub name: String,
    pub regions: Vec<RegionDescriptor>,
    /// Virtual offsets whose reads fail with an address-validity error.
    pub unreadable: Vec<u64>,
}

impl MockLayer {
    pub fn new(name: &str, regions: Vec<RegionDescriptor>) -> Self {
        MockLayer {
            name: name.to_string(),
            regions,
            unreadable: Vec::new(),
        }
    }

    /// Make reads starting at `offset` fail.
    pub fn fail_read_at(mut self, offset: u64) -> Self {
        self.unreadable.push(offset);
        self
    }

    /// The deterministic byte at a virtual offset.
    pub fn byte_at(offset: u64) -> u8 {
        (offset & 0xff) as u8
    }
}

impl TranslationLayer for MockLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn maximum_address(&self) -> u64 {
        self.regions
            .iter()
            .map(RegionDescriptor::virtual_end)
            .max()
            .unwrap_or(1)
            - 1
    }

    fn mapping(
        &self,
        offset: u64,
        length: u64,
        _ignore_errors: bool,
    ) -> Result<Vec<RegionDescriptor>, LayerError> {
        let window_end = offset.saturating_add(length);
        Ok(self
            .regions
            .iter()
            .filter(|r| r.virtual_end() > offset && r.virtual_offset < window_end)
            .cloned()
            .collect())
    }

    fn read(&self, offset: u64, length: u64, _pad: bool) -> Result<Vec<u8>, LayerError> {
        if self.unreadable.contains(&offset) {
            return Err(LayerError::invalid_address(&self.name, offset));
        }
        Ok((0..length).map(|i| Self::byte_at(offset + i)).collect())
    }
}
