//! Bounded history of recently (de)compressed bytes.
//!
//! The window is the shared context of the streaming codec: the encoder extends it with
//! every group it compresses and the decoder extends it with every group it decompresses,
//! so both sides hold identical bytes after each group.
//!
//! Bytes are kept contiguous so the tail can be handed to the block codec as a dictionary
//! slice. Evicted bytes form a dead prefix that is compacted away once it grows past the
//! capacity, which keeps eviction amortized O(1) per byte.

use crate::errors::{Result, try_grow};

/// Default window capacity (1 MiB).
pub const DEFAULT_WINDOW_SIZE: usize = 1024 * 1024;

/// Fixed-capacity FIFO byte window.
#[derive(Debug)]
pub struct DictionaryWindow {
    buf: Vec<u8>,
    start: usize,
    capacity: usize,
}

impl DictionaryWindow {
    /// Creates an empty window that retains at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { buf: Vec::new(), start: 0, capacity }
    }

    /// Appends `bytes`, evicting the oldest content beyond capacity.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        if self.capacity == 0 {
            return Ok(());
        }

        if bytes.len() >= self.capacity {
            self.buf.clear();
            self.start = 0;
            try_grow(&mut self.buf, self.capacity, "dictionary window")?;
            self.buf.extend_from_slice(&bytes[bytes.len() - self.capacity..]);
            return Ok(());
        }

        let overflow = (self.fill() + bytes.len()).saturating_sub(self.capacity);
        self.start += overflow;
        if self.start > self.capacity {
            self.buf.drain(..self.start);
            self.start = 0;
        }

        try_grow(&mut self.buf, bytes.len(), "dictionary window")?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// The retained bytes, oldest first.
    #[must_use]
    pub fn current_slice(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// The most recent `max` bytes (or fewer, if the window holds less).
    #[must_use]
    pub fn tail(&self, max: usize) -> &[u8] {
        let slice = self.current_slice();
        &slice[slice.len().saturating_sub(max)..]
    }

    /// Number of bytes currently retained.
    #[must_use]
    pub fn fill(&self) -> usize {
        self.buf.len() - self.start
    }

    /// Maximum number of bytes retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forgets all history.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
    }
}
