//! BAM file I/O utilities.
//!
//! Helpers for opening BAM files as streams of raw records and writing raw records back out,
//! with consistent error context. Records stay as the undecoded bytes that follow each
//! `block_size` prefix, which is exactly what a spill file stores.

use anyhow::{Context, Result};
use noodles::bgzf::{Reader as BgzfReader, Writer as BgzfWriter};
use noodles::sam::Header;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::record::RawBamReader;

/// Raw BAM reader over a single-threaded BGZF stream.
pub type RawBamFileReader = RawBamReader<BgzfReader<File>>;

/// Raw BAM writer for writing raw record bytes directly.
///
/// Writes records as:
/// - 4-byte `block_size` (little-endian)
/// - raw BAM record bytes
pub struct RawBamWriter<W: Write = File> {
    inner: BgzfWriter<W>,
}

impl<W: Write> RawBamWriter<W> {
    /// Create a new raw BAM writer over an uncompressed sink.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self { inner: BgzfWriter::new(inner) }
    }

    /// Write the BAM header.
    ///
    /// # Errors
    /// Returns an error if writing to the underlying writer fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn write_header(&mut self, header: &Header) -> io::Result<()> {
        // BAM magic
        self.inner.write_all(b"BAM\x01")?;

        // Header text (SAM header serialized using noodles)
        let mut sam_writer = noodles::sam::io::Writer::new(Vec::new());
        sam_writer.write_header(header)?;
        let header_bytes = sam_writer.into_inner();
        let l_text = header_bytes.len() as i32;
        self.inner.write_all(&l_text.to_le_bytes())?;
        self.inner.write_all(&header_bytes)?;

        // Reference sequences
        let n_ref = header.reference_sequences().len() as i32;
        self.inner.write_all(&n_ref.to_le_bytes())?;

        for (name, map) in header.reference_sequences() {
            // l_name: length of name + null terminator
            let l_name = (name.len() + 1) as u32;
            self.inner.write_all(&l_name.to_le_bytes())?;
            self.inner.write_all(name)?;
            self.inner.write_all(&[0u8])?;

            let l_ref = map.length().get() as i32;
            self.inner.write_all(&l_ref.to_le_bytes())?;
        }

        Ok(())
    }

    /// Write a raw BAM record.
    ///
    /// The bytes should be the raw BAM record data (without the 4-byte `block_size` prefix).
    ///
    /// # Errors
    /// Returns an error if the record is too large or writing fails.
    #[inline]
    pub fn write_raw_record(&mut self, record_bytes: &[u8]) -> io::Result<()> {
        let block_size = u32::try_from(record_bytes.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.inner.write_all(&block_size.to_le_bytes())?;
        self.inner.write_all(record_bytes)
    }

    /// Flush buffered data and write the BGZF EOF block.
    ///
    /// # Errors
    /// Returns an error if finalizing the writer fails.
    pub fn finish(mut self) -> io::Result<()> {
        self.inner.try_finish()
    }
}

/// Open a BAM file for raw record access.
///
/// The header is parsed with noodles; the returned reader is positioned at the first record.
///
/// # Errors
/// Returns an error if the file cannot be opened or the header cannot be read
pub fn create_raw_bam_reader<P: AsRef<Path>>(path: P) -> Result<(RawBamFileReader, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let mut noodles_reader = noodles::bam::io::Reader::from(BgzfReader::new(file));
    let header = noodles_reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    // The header has been consumed; hand the BGZF stream to the raw reader.
    Ok((RawBamReader::new(noodles_reader.into_inner()), header))
}

/// Read only the header of a BAM file.
///
/// # Errors
/// Returns an error if the file cannot be opened or the header cannot be read
pub fn read_bam_header<P: AsRef<Path>>(path: P) -> Result<Header> {
    create_raw_bam_reader(path).map(|(_, header)| header)
}

/// Create a raw BAM writer and write the header in one operation.
///
/// # Errors
/// Returns an error if the file cannot be created or the header cannot be written.
pub fn create_raw_bam_writer<P: AsRef<Path>>(path: P, header: &Header) -> Result<RawBamWriter> {
    let path_ref = path.as_ref();
    let output_file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;

    let mut writer = RawBamWriter::new(output_file);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;
    Ok(writer)
}
