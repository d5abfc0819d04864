//! Translation Layer Trait
//!
//! Core abstraction for reading a translated address space.

use super::RegionDescriptor;
use thiserror::Error;

/// Errors raised by translation layers.
#[derive(Debug, Error)]
pub enum LayerError {
    /// An offset could not be resolved by the named layer.
    #[error("invalid address {offset:#x} in layer {layer}")]
    InvalidAddress { layer: String, offset: u64 },

    /// A pagemap sidecar line that could not be parsed.
    #[error("malformed pagemap {path} line {line}: {text:?}")]
    MalformedPagemap {
        path: String,
        line: usize,
        text: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayerError {
    pub(crate) fn invalid_address(layer: &str, offset: u64) -> Self {
        LayerError::InvalidAddress {
            layer: layer.to_string(),
            offset,
        }
    }
}

/// A translated view of some address space.
///
/// Implementations map virtual windows onto a lower backing layer and read
/// bytes through that mapping.
pub trait TranslationLayer {
    /// Layer identifier, used in region descriptors and error reports.
    fn name(&self) -> &str;

    /// Largest addressable offset (inclusive).
    fn maximum_address(&self) -> u64;

    /// Enumerate mapped regions intersecting `length` bytes from `offset`,
    /// in ascending virtual order, clipped to the window.
    ///
    /// With `ignore_errors`, unmapped or invalid sub-ranges are omitted
    /// instead of failing the whole enumeration.
    fn mapping(
        &self,
        offset: u64,
        length: u64,
        ignore_errors: bool,
    ) -> Result<Vec<RegionDescriptor>, LayerError>;

    /// Read `length` bytes at `offset`.
    ///
    /// With `pad`, zero bytes substitute for unmapped gaps in the span.
    /// Address-validity conditions that padding cannot cover (a mapped page
    /// whose backing bytes are missing) still fail.
    fn read(&self, offset: u64, length: u64, pad: bool) -> Result<Vec<u8>, LayerError>;
}
