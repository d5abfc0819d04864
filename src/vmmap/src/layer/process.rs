//! Process Pagemap Layer
//!
//! One process's virtual address space, translated into the capture image
//! through the pagemap sidecar recorded at capture time.
//!
//! Sidecar format, one entry per line (`#` comments and blank lines allowed):
//!
//! ```text
//! 0xVA_START 0xVA_END SIZE 0xRAW_FILE_OFFSET
//! ```

use super::{ImageLayer, LayerError, RegionDescriptor, TranslationLayer};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One pagemap line: a contiguous virtual run and where its bytes landed in
/// the capture image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PagemapEntry {
    virt_start: u64,
    virt_end: u64,
    backing_offset: u64,
}

impl PagemapEntry {
    fn size(&self) -> u64 {
        self.virt_end - self.virt_start
    }
}

/// A process's virtual address space backed by the capture image.
#[derive(Debug)]
pub struct ProcessLayer {
    name: String,
    image: Arc<ImageLayer>,
    /// Sorted by virtual start, non-overlapping.
    entries: Vec<PagemapEntry>,
    max_address: u64,
}

impl ProcessLayer {
    /// Parse a pagemap sidecar and bind it to the capture image.
    ///
    /// Entries are sorted by virtual start. Overlapping virtual runs mean
    /// the sidecar does not describe a valid address space and fail
    /// materialization with the offending virtual offset.
    pub fn open(pid: u32, image: Arc<ImageLayer>, pagemap: &Path) -> Result<Self, LayerError> {
        let name = format!("proc-{pid}");
        let text = fs::read_to_string(pagemap)?;

        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry =
                parse_pagemap_line(line).ok_or_else(|| LayerError::MalformedPagemap {
                    path: pagemap.display().to_string(),
                    line: index + 1,
                    text: line.to_string(),
                })?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| e.virt_start);
        for pair in entries.windows(2) {
            if pair[1].virt_start < pair[0].virt_end {
                return Err(LayerError::invalid_address(&name, pair[1].virt_start));
            }
        }

        let max_address = entries.last().map(|e| e.virt_end - 1).unwrap_or(0);
        Ok(ProcessLayer {
            name,
            image,
            entries,
            max_address,
        })
    }

    /// Number of mapped virtual runs.
    pub fn region_count(&self) -> usize {
        self.entries.len()
    }

    /// Total mapped bytes across all runs.
    pub fn mapped_bytes(&self) -> u64 {
        self.entries.iter().map(PagemapEntry::size).sum()
    }
}

impl TranslationLayer for ProcessLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn maximum_address(&self) -> u64 {
        self.max_address
    }

    fn mapping(
        &self,
        offset: u64,
        length: u64,
        ignore_errors: bool,
    ) -> Result<Vec<RegionDescriptor>, LayerError> {
        let window_end = offset.saturating_add(length);
        let mut regions = Vec::new();

        for entry in &self.entries {
            if entry.virt_end <= offset || entry.virt_start >= window_end {
                continue;
            }
            let start = entry.virt_start.max(offset);
            let end = entry.virt_end.min(window_end);
            let backing = entry.backing_offset + (start - entry.virt_start);

            if backing >= self.image.len() {
                // The backing run lies wholly outside the capture image.
                if ignore_errors {
                    continue;
                }
                return Err(LayerError::invalid_address(self.image.name(), backing));
            }

            regions.push(RegionDescriptor {
                virtual_offset: start,
                virtual_size: end - start,
                backing_offset: backing,
                backing_size: end - start,
                backing_layer: self.image.name().to_string(),
            });
        }

        Ok(regions)
    }

    fn read(&self, offset: u64, length: u64, pad: bool) -> Result<Vec<u8>, LayerError> {
        let span_end = offset.saturating_add(length);
        let mut data = vec![0u8; length as usize];
        let mut cursor = offset;

        for entry in &self.entries {
            if entry.virt_end <= cursor || entry.virt_start >= span_end {
                continue;
            }
            let start = entry.virt_start.max(cursor);
            if start > cursor && !pad {
                return Err(LayerError::invalid_address(&self.name, cursor));
            }
            let end = entry.virt_end.min(span_end);
            let backing = entry.backing_offset + (start - entry.virt_start);

            // Strict image read even under `pad`: the run is mapped, so a
            // truncated capture image is an address-validity failure, not a
            // paddable hole.
            let bytes = self.image.read(backing, end - start, false)?;
            let dst = (start - offset) as usize;
            data[dst..dst + bytes.len()].copy_from_slice(&bytes);
            cursor = end;
        }

        if cursor < span_end && !pad {
            return Err(LayerError::invalid_address(&self.name, cursor));
        }
        Ok(data)
    }
}

fn parse_pagemap_line(line: &str) -> Option<PagemapEntry> {
    let mut fields = line.split_whitespace();
    let virt_start = parse_hex(fields.next()?)?;
    let virt_end = parse_hex(fields.next()?)?;
    let size = parse_size(fields.next()?)?;
    let backing_offset = parse_hex(fields.next()?)?;

    // The size column is redundant with the virtual range; a mismatch means
    // the sidecar is self-inconsistent.
    if virt_end <= virt_start || virt_end - virt_start != size {
        return None;
    }

    Some(PagemapEntry {
        virt_start,
        virt_end,
        backing_offset,
    })
}

fn parse_hex(field: &str) -> Option<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).ok()
}

/// The size column is decimal in capture-tool output, but hex is accepted.
fn parse_size(field: &str) -> Option<u64> {
    if let Some(digits) = field.strip_prefix("0x") {
        u64::from_str_radix(digits, 16).ok()
    } else {
        field.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn fixture(image_bytes: &[u8], pagemap: &str) -> (TempDir, Arc<ImageLayer>, ProcessLayer) {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("capture.raw");
        File::create(&image_path)
            .unwrap()
            .write_all(image_bytes)
            .unwrap();
        let pagemap_path = dir.path().join("pid.1.pagemap");
        fs::write(&pagemap_path, pagemap).unwrap();

        let image = Arc::new(ImageLayer::open(&image_path).unwrap());
        let layer = ProcessLayer::open(1, Arc::clone(&image), &pagemap_path).unwrap();
        (dir, image, layer)
    }

    #[test]
    fn test_parse_pagemap_line_formats() {
        // Decimal size column, as written by capture tools.
        let entry = parse_pagemap_line("0x0000000000001000 0x0000000000002000 4096 0x000000000000").unwrap();
        assert_eq!(entry.virt_start, 0x1000);
        assert_eq!(entry.virt_end, 0x2000);
        assert_eq!(entry.backing_offset, 0);

        // Hex size column.
        assert!(parse_pagemap_line("0x1000 0x2000 0x1000 0x40").is_some());

        // Size mismatch.
        assert!(parse_pagemap_line("0x1000 0x2000 512 0x40").is_none());

        // Truncated line.
        assert!(parse_pagemap_line("0x1000 0x2000 4096").is_none());
    }

    #[test]
    fn test_open_skips_comments_and_blanks() {
        let (_dir, _image, layer) = fixture(
            &[0u8; 0x40],
            "# Memory region mapping\n# Format: VA_START VA_END SIZE RAW_FILE_OFFSET\n#\n\n0x1000 0x1020 32 0x00\n0x2000 0x2020 32 0x20\n",
        );
        assert_eq!(layer.region_count(), 2);
        assert_eq!(layer.mapped_bytes(), 64);
        assert_eq!(layer.maximum_address(), 0x201f);
    }

    #[test]
    fn test_open_rejects_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("capture.raw");
        fs::write(&image_path, [0u8; 16]).unwrap();
        let pagemap_path = dir.path().join("pid.1.pagemap");
        fs::write(&pagemap_path, "0x1000 garbage 32 0x00\n").unwrap();

        let image = Arc::new(ImageLayer::open(&image_path).unwrap());
        let err = ProcessLayer::open(1, image, &pagemap_path).unwrap_err();
        assert!(matches!(err, LayerError::MalformedPagemap { line: 1, .. }));
    }

    #[test]
    fn test_open_rejects_overlapping_runs() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("capture.raw");
        fs::write(&image_path, [0u8; 0x40]).unwrap();
        let pagemap_path = dir.path().join("pid.1.pagemap");
        fs::write(&pagemap_path, "0x1000 0x1020 32 0x00\n0x1010 0x1030 32 0x20\n").unwrap();

        let image = Arc::new(ImageLayer::open(&image_path).unwrap());
        let err = ProcessLayer::open(1, image, &pagemap_path).unwrap_err();
        match err {
            LayerError::InvalidAddress { layer, offset } => {
                assert_eq!(layer, "proc-1");
                assert_eq!(offset, 0x1010);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mapping_full_range() {
        let (_dir, _image, layer) = fixture(
            &[0u8; 0x40],
            "0x1000 0x1020 32 0x00\n0x2000 0x2020 32 0x20\n",
        );
        let regions = layer.mapping(0, layer.maximum_address() + 1, true).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].virtual_offset, 0x1000);
        assert_eq!(regions[0].backing_offset, 0x00);
        assert_eq!(regions[1].virtual_offset, 0x2000);
        assert_eq!(regions[1].backing_offset, 0x20);
        assert_eq!(regions[1].backing_layer, "capture");
    }

    #[test]
    fn test_mapping_clips_to_window() {
        let (_dir, _image, layer) = fixture(&[0u8; 0x40], "0x1000 0x1040 64 0x00\n");
        let regions = layer.mapping(0x1010, 0x10, true).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].virtual_offset, 0x1010);
        assert_eq!(regions[0].virtual_size, 0x10);
        assert_eq!(regions[0].backing_offset, 0x10);
    }

    #[test]
    fn test_mapping_skips_runs_outside_image() {
        // Second run claims backing at 0x1000, far past the 0x40-byte image.
        let (_dir, _image, layer) = fixture(
            &[0u8; 0x40],
            "0x1000 0x1020 32 0x00\n0x2000 0x2020 32 0x1000\n",
        );
        let regions = layer.mapping(0, layer.maximum_address() + 1, true).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].virtual_offset, 0x1000);

        let err = layer
            .mapping(0, layer.maximum_address() + 1, false)
            .unwrap_err();
        assert!(matches!(
            err,
            LayerError::InvalidAddress { offset: 0x1000, .. }
        ));
    }

    #[test]
    fn test_read_through_mapping() {
        let bytes: Vec<u8> = (0u8..0x40).collect();
        let (_dir, _image, layer) = fixture(&bytes, "0x1000 0x1010 16 0x20\n");
        assert_eq!(layer.read(0x1000, 16, false).unwrap(), &bytes[0x20..0x30]);
    }

    #[test]
    fn test_read_pads_unmapped_gap() {
        let bytes: Vec<u8> = (1u8..=0x40).collect();
        let (_dir, _image, layer) = fixture(
            &bytes,
            "0x1000 0x1008 8 0x00\n0x1010 0x1018 8 0x08\n",
        );

        let data = layer.read(0x1000, 0x18, true).unwrap();
        assert_eq!(&data[..8], &bytes[..8]);
        assert_eq!(&data[8..16], &[0u8; 8]);
        assert_eq!(&data[16..24], &bytes[8..16]);

        let err = layer.read(0x1000, 0x18, false).unwrap_err();
        assert!(matches!(
            err,
            LayerError::InvalidAddress { offset: 0x1008, .. }
        ));
    }

    #[test]
    fn test_read_fails_on_truncated_image_despite_pad() {
        // Run is mapped but its backing extends past the 16-byte image.
        let (_dir, _image, layer) = fixture(&[0u8; 16], "0x1000 0x1020 32 0x00\n");
        let err = layer.read(0x1000, 32, true).unwrap_err();
        match err {
            LayerError::InvalidAddress { layer, offset } => {
                assert_eq!(layer, "capture");
                assert_eq!(offset, 16);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
