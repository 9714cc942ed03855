//! Records as the spill file sees them.
//!
//! The spill core never interprets a record: it measures it, copies its bytes into a group,
//! and copies them back out into a caller-owned object. [`SpillRecord`] is that boundary.
//!
//! Two implementations are provided:
//!
//! - `Vec<u8>` for arbitrary opaque blobs
//! - [`RawRecord`] for raw BAM record bytes, read straight from a BGZF stream with
//!   [`RawBamReader`] without decoding any fields
//!
//! # BAM Record Binary Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0-3     4     refID (i32) - reference sequence ID
//! 4-7     4     pos (i32) - 0-based leftmost position
//! 8       1     l_read_name (u8) - length including null
//! 9       1     mapq (u8) - mapping quality
//! 10-11   2     bin (u16) - BAM bin
//! 12-13   2     n_cigar_op (u16) - CIGAR operation count
//! 14-15   2     flag (u16) - bitwise flags
//! 16-19   4     l_seq (u32) - sequence length
//! 20-23   4     next_refID (i32) - mate reference ID
//! 24-27   4     next_pos (i32) - mate position
//! 28-31   4     tlen (i32) - template length
//! 32+     var   read_name, CIGAR, sequence, quality, aux data
//! ```

use std::io::{self, Read};

/// Serialization boundary between caller-owned records and the spill file.
///
/// The trait is object safe so lifecycle calls can take an optional `&mut dyn SpillRecord`
/// to reset.
pub trait SpillRecord {
    /// Number of bytes [`encode_into`](Self::encode_into) appends.
    fn encoded_len(&self) -> usize;

    /// Appends the serialized record to `dst`.
    fn encode_into(&self, dst: &mut Vec<u8>);

    /// Replaces the contents of this record with the one serialized in `src`.
    ///
    /// # Errors
    ///
    /// Returns an error message if `src` is not a valid serialization.
    fn decode_from(&mut self, src: &[u8]) -> Result<(), String>;

    /// Drops any storage held by this record so the object can be reused or discarded.
    fn release(&mut self);
}

impl SpillRecord for Vec<u8> {
    fn encoded_len(&self) -> usize {
        self.len()
    }

    fn encode_into(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(self);
    }

    fn decode_from(&mut self, src: &[u8]) -> Result<(), String> {
        self.clear();
        self.extend_from_slice(src);
        Ok(())
    }

    fn release(&mut self) {
        *self = Vec::new();
    }
}

/// Size of the fixed-length portion of a BAM record.
pub const BAM_FIXED_LEN: usize = 32;

/// A raw BAM record stored as bytes.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct RawRecord(Vec<u8>);

impl RawRecord {
    /// Creates a new empty raw record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the length of the record in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the read name without its NUL terminator, if the record is long enough.
    #[must_use]
    pub fn name(&self) -> Option<&[u8]> {
        let l_read_name = usize::from(*self.0.get(8)?);
        let name = self.0.get(BAM_FIXED_LEN..BAM_FIXED_LEN + l_read_name)?;
        Some(name.strip_suffix(&[0]).unwrap_or(name))
    }

    /// Returns the inner bytes, consuming the record.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRecord")
            .field("len", &self.0.len())
            .field("name", &self.name().map(bstr::BStr::new))
            .finish()
    }
}

impl AsRef<[u8]> for RawRecord {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for RawRecord {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for RawRecord {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self(buf)
    }
}

impl SpillRecord for RawRecord {
    fn encoded_len(&self) -> usize {
        self.0.len()
    }

    fn encode_into(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.0);
    }

    fn decode_from(&mut self, src: &[u8]) -> Result<(), String> {
        if src.len() < BAM_FIXED_LEN {
            return Err(format!(
                "BAM record of {} bytes is shorter than the {BAM_FIXED_LEN}-byte fixed fields",
                src.len()
            ));
        }
        self.0.clear();
        self.0.extend_from_slice(src);
        Ok(())
    }

    fn release(&mut self) {
        self.0 = Vec::new();
    }
}

/// Reads a single raw BAM record from the given reader.
///
/// Reads the 4-byte `block_size` prefix and then `block_size` bytes of record data.
/// Returns the number of bytes read (excluding the prefix), or 0 at EOF.
///
/// # Errors
///
/// Returns an error if the reader fails or EOF is reached in the middle of a record.
pub fn read_raw_record<R>(reader: &mut R, record: &mut RawRecord) -> io::Result<usize>
where
    R: Read,
{
    let block_size = match read_block_size(reader)? {
        0 => return Ok(0),
        n => n,
    };

    record.0.resize(block_size, 0);
    reader.read_exact(&mut record.0)?;

    Ok(block_size)
}

/// Reads the 4-byte block size prefix. Returns 0 at EOF.
fn read_block_size<R>(reader: &mut R) -> io::Result<usize>
where
    R: Read,
{
    let mut buf = [0u8; 4];

    loop {
        match reader.read(&mut buf[..1]) {
            Ok(0) => return Ok(0),
            Ok(_) => break,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    reader.read_exact(&mut buf[1..])?;

    let n = u32::from_le_bytes(buf);
    usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// A reader for raw BAM records.
///
/// Wraps a decompressed BAM stream positioned just after the header.
pub struct RawBamReader<R> {
    inner: R,
}

impl<R: Read> RawBamReader<R> {
    /// Creates a new raw BAM reader wrapping the given reader.
    #[inline]
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consumes the reader and returns the inner reader.
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads a single raw BAM record.
    ///
    /// Returns the number of bytes read, or 0 at EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or if EOF is encountered mid-record.
    #[inline]
    pub fn read_record(&mut self, record: &mut RawRecord) -> io::Result<usize> {
        read_raw_record(&mut self.inner, record)
    }
}
