//! Length-prefixed frames on the backing file.
//!
//! ```text
//! stream     := frame* terminator
//! frame      := length: u64 LE, payload[length]     (length > 0)
//! terminator := length: u64 LE = 0
//! ```

use std::io::{self, Read, Write};

use crate::errors::{Result, SpillError, try_grow};

/// Size of the frame length prefix.
pub const FRAME_LEN_SIZE: usize = 8;

/// Largest frame payload a reader will accept (4 GiB).
pub const MAX_FRAME_LEN: u64 = 1 << 32;

/// Result of reading one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A payload of this many bytes was read into the caller's buffer.
    Data(usize),
    /// The terminator was reached.
    End,
}

/// Writes frames and the terminator to an underlying writer.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
    frames: u64,
    bytes: u64,
    terminated: bool,
}

impl<W: Write> FrameWriter<W> {
    /// Wraps `inner`, which should be positioned at the start of the stream.
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0, bytes: 0, terminated: false }
    }

    /// Writes one non-empty frame.
    ///
    /// # Errors
    ///
    /// Returns an input error for empty payloads or after the terminator, and a file error
    /// if the write fails.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        if self.terminated {
            return Err(SpillError::input("cannot write a frame after the terminator"));
        }
        if payload.is_empty() {
            return Err(SpillError::input("zero-length frames are reserved for the terminator"));
        }

        let len = payload.len() as u64;
        self.write_all(&len.to_le_bytes())?;
        self.write_all(payload)?;
        self.frames += 1;
        self.bytes += (FRAME_LEN_SIZE + payload.len()) as u64;
        Ok(())
    }

    /// Writes the zero-length terminator frame. May be called once.
    ///
    /// # Errors
    ///
    /// Returns an input error if the stream is already terminated, and a file error if the
    /// write fails.
    pub fn write_terminator(&mut self) -> Result<()> {
        if self.terminated {
            return Err(SpillError::input("terminator already written"));
        }
        self.write_all(&0u64.to_le_bytes())?;
        self.terminated = true;
        self.bytes += FRAME_LEN_SIZE as u64;
        Ok(())
    }

    /// Flushes buffered output to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| SpillError::file("Failed to flush spill file", e))
    }

    /// Number of data frames written.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total bytes written, including length prefixes and the terminator.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Consumes the writer, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf).map_err(|e| SpillError::file("Failed to write frame", e))
    }
}

/// Reads frames from an underlying reader.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    frames: u64,
    bytes: u64,
    ended: bool,
}

impl<R: Read> FrameReader<R> {
    /// Wraps `inner`, which should be positioned at the start of the stream.
    pub fn new(inner: R) -> Self {
        Self { inner, frames: 0, bytes: 0, ended: false }
    }

    /// Reads the next frame's payload into `buf`, replacing its contents.
    ///
    /// [`Frame::End`] is returned exactly once, for the terminator.
    ///
    /// # Errors
    ///
    /// Returns an input error when called again after [`Frame::End`] or when the declared
    /// length exceeds [`MAX_FRAME_LEN`], and a file error on read failure or truncation.
    pub fn read_frame(&mut self, buf: &mut Vec<u8>) -> Result<Frame> {
        if self.ended {
            return Err(SpillError::input("frame requested after end of stream"));
        }

        let mut len_buf = [0u8; FRAME_LEN_SIZE];
        self.read_exact(&mut len_buf, "frame length")?;
        self.bytes += FRAME_LEN_SIZE as u64;

        let len = u64::from_le_bytes(len_buf);
        if len == 0 {
            self.ended = true;
            return Ok(Frame::End);
        }
        if len > MAX_FRAME_LEN {
            return Err(SpillError::input(format!(
                "frame {} declares {len} bytes, more than the {MAX_FRAME_LEN}-byte limit",
                self.frames
            )));
        }

        let len = usize::try_from(len)
            .map_err(|_| SpillError::input(format!("frame length {len} does not fit in memory")))?;
        buf.clear();
        try_grow(buf, len, "frame buffer")?;
        buf.resize(len, 0);
        self.read_exact(buf, "frame payload")?;

        self.frames += 1;
        self.bytes += len as u64;
        Ok(Frame::Data(len))
    }

    /// Number of data frames read.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total bytes read, including length prefixes and the terminator.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns true once the terminator has been read.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn read_exact(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            let context = if e.kind() == io::ErrorKind::UnexpectedEof {
                format!("Truncated spill file while reading {what} of frame {}", self.frames)
            } else {
                format!("Failed to read {what} of frame {}", self.frames)
            };
            SpillError::file(context, e)
        })
    }
}
