use log::debug;

use super::{ExportError, ParseError};
use crate::config::{DEFAULT_MAX_IMAGE_SIZE, DEFAULT_PAD_BYTE};
use crate::MemoryImage;

#[derive(Debug, Clone)]
pub struct BinaryWriteOptions {
    /// Fills gaps between blocks.
    pub pad_byte: u8,
    /// Largest buffer the export may allocate.
    pub max_size: usize,
}

impl Default for BinaryWriteOptions {
    fn default() -> Self {
        Self {
            pad_byte: DEFAULT_PAD_BYTE,
            max_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

/// Parse a raw binary blob into a single block at the given base address.
pub fn parse_binary(data: &[u8], base_address: u32) -> Result<MemoryImage, ParseError> {
    Ok(MemoryImage::from_writes([(base_address, data.to_vec())])?)
}

/// Flatten the image into one buffer from its lowest to its highest address.
///
/// Returns the base address alongside the buffer; an empty image yields
/// `(0, [])`.
pub fn to_binary_image(
    image: &MemoryImage,
    options: &BinaryWriteOptions,
) -> Result<(u32, Vec<u8>), ExportError> {
    let (Some(min_addr), Some(max_addr)) = (image.min_address(), image.max_address()) else {
        return Ok((0, Vec::new()));
    };

    // Compute span in u64 to avoid overflow
    let span = (max_addr as u64) - (min_addr as u64) + 1;
    if span > options.max_size as u64 {
        return Err(ExportError::ImageTooLarge {
            span,
            limit: options.max_size,
        });
    }

    let mut data = vec![options.pad_byte; span as usize];
    for block in image.blocks() {
        let offset = (block.start - min_addr) as usize;
        data[offset..offset + block.bytes.len()].copy_from_slice(&block.bytes);
    }

    debug!(
        "binary image at {min_addr:#010X}: {span} bytes, {} padded",
        span - image.total_bytes()
    );
    Ok((min_addr, data))
}
