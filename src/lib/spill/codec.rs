//! Streaming LZ4 compression across groups.
//!
//! Each group is compressed as one LZ4 block using the tail of a [`DictionaryWindow`] as an
//! external dictionary, then the window is extended with the group's uncompressed bytes.
//! The decoder mirrors this exactly, so matches in group *k* may point back into groups
//! *k-1*, *k-2*, ... as long as they are within the LZ4 match distance.
//!
//! # Block layout
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ uncompressed_len: u32 LE     │
//! │ crc32: u32 LE                │
//! ├──────────────────────────────┤
//! │ LZ4 block                    │
//! └──────────────────────────────┘
//! ```
//!
//! The CRC covers the bytes as stored: the length field followed by the LZ4 block. It is
//! checked before anything is decoded, so a damaged block is reported as a compression
//! error even when the damage would still decode to plausible bytes.

use log::trace;
use lz4_flex::block::{
    compress_into_with_dict, decompress_into_with_dict, get_maximum_output_size,
};

use crate::errors::{Result, SpillError, try_grow};
use crate::spill::window::DictionaryWindow;

/// Size of the block header preceding the LZ4 data.
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Furthest back an LZ4 match can reach.
pub const LZ4_MAX_DISTANCE: usize = 64 * 1024 - 1;

/// Write-side session: compresses groups against a rolling dictionary.
#[derive(Debug)]
pub struct Lz4StreamEncoder {
    window: DictionaryWindow,
}

impl Lz4StreamEncoder {
    /// Creates an encoder with an empty window of `window_size` bytes.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self { window: DictionaryWindow::new(window_size) }
    }

    /// Compresses `input` into `out` (replacing its contents) and advances the window.
    ///
    /// # Errors
    ///
    /// Returns a compression error if the group is too large for the block header or the
    /// LZ4 encoder fails, and a memory error if `out` cannot grow.
    pub fn compress_group(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        let uncompressed_len = u32::try_from(input.len()).map_err(|_| {
            SpillError::compression(format!("group of {} bytes exceeds 4 GiB", input.len()))
        })?;

        let bound = BLOCK_HEADER_SIZE + get_maximum_output_size(input.len());
        out.clear();
        try_grow(out, bound, "compression buffer")?;
        out.resize(bound, 0);

        out[..4].copy_from_slice(&uncompressed_len.to_le_bytes());

        let dict = self.window.tail(LZ4_MAX_DISTANCE);
        let written = compress_into_with_dict(input, &mut out[BLOCK_HEADER_SIZE..], dict)
            .map_err(|e| SpillError::compression(format!("LZ4 compression failed: {e}")))?;
        out.truncate(BLOCK_HEADER_SIZE + written);

        let crc = stored_crc(&out[..4], &out[BLOCK_HEADER_SIZE..]);
        out[4..BLOCK_HEADER_SIZE].copy_from_slice(&crc.to_le_bytes());

        trace!(
            "compressed group {} -> {} bytes with {}-byte dictionary",
            input.len(),
            out.len(),
            dict.len()
        );

        self.window.extend(input)
    }

    /// The encoder's dictionary window.
    #[must_use]
    pub fn window(&self) -> &DictionaryWindow {
        &self.window
    }
}

/// Read-side session: decompresses blocks against a rolling dictionary.
#[derive(Debug)]
pub struct Lz4StreamDecoder {
    window: DictionaryWindow,
}

impl Lz4StreamDecoder {
    /// Creates a decoder with an empty window of `window_size` bytes.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self { window: DictionaryWindow::new(window_size) }
    }

    /// Decompresses `block` into `out` (replacing its contents) and advances the window.
    ///
    /// # Errors
    ///
    /// Returns a compression error if the block is truncated, fails to decode, decodes to
    /// the wrong length, or fails its checksum.
    pub fn decompress_block(&mut self, block: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if block.len() < BLOCK_HEADER_SIZE {
            return Err(SpillError::compression(format!(
                "block of {} bytes is shorter than its {BLOCK_HEADER_SIZE}-byte header",
                block.len()
            )));
        }

        let expected_len = u32::from_le_bytes([block[0], block[1], block[2], block[3]]) as usize;
        let expected_crc = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        let compressed = &block[BLOCK_HEADER_SIZE..];

        let actual_crc = stored_crc(&block[..4], compressed);
        if actual_crc != expected_crc {
            return Err(SpillError::compression(format!(
                "CRC32 mismatch: expected 0x{expected_crc:08x}, got 0x{actual_crc:08x}, \
                 block_size={}, uncompressed_size={expected_len}",
                block.len()
            )));
        }

        // A block can expand at most ~255x; anything beyond that is a damaged header.
        if expected_len > compressed.len().saturating_mul(255).saturating_add(16) {
            return Err(SpillError::compression(format!(
                "declared size {expected_len} is impossible for a {}-byte block",
                compressed.len()
            )));
        }

        out.clear();
        try_grow(out, expected_len, "decompression buffer")?;
        out.resize(expected_len, 0);

        let dict = self.window.tail(LZ4_MAX_DISTANCE);
        let written = decompress_into_with_dict(compressed, out, dict)
            .map_err(|e| SpillError::compression(format!("LZ4 decompression failed: {e}")))?;
        if written != expected_len {
            return Err(SpillError::compression(format!(
                "block decompressed to {written} bytes, expected {expected_len}"
            )));
        }

        self.window.extend(out)
    }

    /// The decoder's dictionary window.
    #[must_use]
    pub fn window(&self) -> &DictionaryWindow {
        &self.window
    }
}

/// CRC32 of a block's length field and LZ4 bytes.
fn stored_crc(len_field: &[u8], compressed: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(len_field);
    hasher.update(compressed);
    hasher.finalize()
}
