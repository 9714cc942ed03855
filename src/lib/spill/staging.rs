//! In-memory staging area for one group of records.
//!
//! On the write side records are appended as `[len: u32 LE][bytes]` until the group is
//! flushed. On the read side the buffer is loaded with one decompressed group and drained
//! one record at a time through a cursor.

use crate::errors::{Result, SpillError, try_grow};
use crate::record::SpillRecord;

/// Size of the per-record length prefix inside a group.
pub const RECORD_LEN_SIZE: usize = 4;

/// Growable byte buffer with a record count and a read cursor.
#[derive(Debug)]
pub struct StagingBuffer {
    data: Vec<u8>,
    records: usize,
    cursor: usize,
}

impl StagingBuffer {
    /// Creates an empty buffer with `capacity` bytes pre-allocated.
    ///
    /// The capacity is only a starting point; [`append`](Self::append) grows as needed.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        try_grow(&mut data, capacity, "staging buffer")?;
        Ok(Self { data, records: 0, cursor: 0 })
    }

    /// Serializes `record` onto the end of the buffer.
    ///
    /// # Errors
    ///
    /// Returns an input error if the record does not fit a 32-bit length prefix, or a memory
    /// error if the buffer cannot grow.
    pub fn append<R: SpillRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        let len = record.encoded_len();
        let prefix = u32::try_from(len).map_err(|_| {
            SpillError::input(format!("record of {len} bytes exceeds the 4 GiB record limit"))
        })?;

        try_grow(&mut self.data, RECORD_LEN_SIZE + len, "staging buffer")?;
        self.data.extend_from_slice(&prefix.to_le_bytes());
        let start = self.data.len();
        record.encode_into(&mut self.data);

        let written = self.data.len() - start;
        if written != len {
            self.data.truncate(start - RECORD_LEN_SIZE);
            return Err(SpillError::input(format!(
                "record reported {len} encoded bytes but wrote {written}"
            )));
        }

        self.records += 1;
        Ok(())
    }

    /// Clears the contents and counters, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.records = 0;
        self.cursor = 0;
    }

    /// Mutable access to the backing storage for loading a decompressed group.
    ///
    /// The buffer is reset first; the caller fills the returned vector.
    pub fn load(&mut self) -> &mut Vec<u8> {
        self.reset();
        &mut self.data
    }

    /// Returns the next record in the buffer and advances the cursor past it.
    ///
    /// Returns `Ok(None)` once every record has been drained.
    ///
    /// # Errors
    ///
    /// Returns an input error if a length prefix is truncated or points past the end of
    /// the loaded group.
    pub fn next_record(&mut self) -> Result<Option<&[u8]>> {
        if self.is_drained() {
            return Ok(None);
        }

        let remaining = self.data.len() - self.cursor;
        if remaining < RECORD_LEN_SIZE {
            return Err(SpillError::input(format!(
                "truncated record length at offset {} of a {}-byte group",
                self.cursor,
                self.data.len()
            )));
        }

        let prefix: [u8; RECORD_LEN_SIZE] = self.data
            [self.cursor..self.cursor + RECORD_LEN_SIZE]
            .try_into()
            .map_err(|_| SpillError::input("unreadable record length"))?;
        let len = u32::from_le_bytes(prefix) as usize;

        let start = self.cursor + RECORD_LEN_SIZE;
        if len > self.data.len() - start {
            return Err(SpillError::input(format!(
                "record of {len} bytes at offset {} overruns a {}-byte group",
                self.cursor,
                self.data.len()
            )));
        }

        self.cursor = start + len;
        self.records += 1;
        Ok(Some(&self.data[start..start + len]))
    }

    /// The staged bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes currently staged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no bytes are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Records appended (write side) or drained (read side) since the last reset.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Returns true if the read cursor has consumed every loaded byte.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.cursor >= self.data.len()
    }
}
