//! Region Descriptor
//!
//! The unit produced by translation-layer enumeration.

/// One contiguous mapped unit of a virtual address space.
///
/// Produced during a streaming enumeration pass; the virtual run
/// `virtual_offset..virtual_offset + virtual_size` is backed by the run
/// `backing_offset..backing_offset + backing_size` in `backing_layer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor {
    /// Start of the run in the process's virtual address space.
    pub virtual_offset: u64,
    /// Length of the virtual run in bytes (always non-zero).
    pub virtual_size: u64,
    /// Start of the backing run in the layer below.
    pub backing_offset: u64,
    /// Length of the backing run in bytes.
    pub backing_size: u64,
    /// Name of the layer the backing run lives in.
    pub backing_layer: String,
}

impl RegionDescriptor {
    /// First virtual offset past the end of this region.
    pub fn virtual_end(&self) -> u64 {
        self.virtual_offset + self.virtual_size
    }
}
