//! Compressed, record-oriented spill files.
//!
//! A [`SpillFile`] is the temporary store an external sort writes a chunk of records to and
//! later streams them back from. Records are batched into groups, each group is compressed
//! as one LZ4 block against a rolling dictionary of earlier groups, and every block is
//! written as a length-prefixed frame. A zero-length frame terminates the stream.
//!
//! # Lifecycle
//!
//! ```text
//!            open_write
//!                │
//!            WriteOpen ──── write(record)
//!             │      │
//!   close_write      end_write
//!             │      │
//! WriteFinalizedClosed   WriteFinalizedOpen
//!             │      │            │
//!         open_read  open_read    begin_read (same descriptor, rewound)
//!             └──────┴─────┬──────┘
//!                      ReadOpen ──── read(record)
//!                          │
//!                       destroy
//! ```
//!
//! Writing and reading are only legal in their own mode; calling them elsewhere is an
//! [`ErrorKind::Input`](crate::errors::ErrorKind::Input) error. A file or compression
//! failure while streaming leaves the spill file `Closed`, because the dictionary state
//! can no longer be trusted; the caller is expected to [`destroy`](SpillFile::destroy) it.
//!
//! # Example
//!
//! ```
//! use samspill_lib::spill::{SpillConfig, SpillFile};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let mut spill = SpillFile::open_write(dir.path().join("chunk.spill"), SpillConfig::default())?;
//! for i in 0..250u32 {
//!     spill.write(&i.to_le_bytes().to_vec())?;
//! }
//! spill.end_write()?;
//! spill.begin_read(None)?;
//!
//! let mut record = Vec::new();
//! let mut count = 0;
//! while spill.read(&mut record)?.is_some() {
//!     count += 1;
//! }
//! assert_eq!(count, 250);
//! spill.destroy(Some(&mut record), true)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod frame;
pub mod staging;
pub mod window;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::errors::{Result, SpillError};
use crate::record::SpillRecord;

pub use codec::{Lz4StreamDecoder, Lz4StreamEncoder};
pub use frame::{Frame, FrameReader, FrameWriter};
pub use staging::StagingBuffer;
pub use window::{DEFAULT_WINDOW_SIZE, DictionaryWindow};

/// Default number of records compressed together as one group.
pub const DEFAULT_GROUP_SIZE: usize = 100;

/// Default initial size of the staging buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// I/O buffer size for the backing file.
const IO_BUFFER_SIZE: usize = 256 * 1024;

/// Tuning knobs for a [`SpillFile`].
///
/// `buffer_size` is only the initial allocation of the staging buffer: records larger than
/// it are accepted and the buffer grows. `verbose` only adds log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpillConfig {
    /// Records per compressed group.
    pub group_size: usize,
    /// Initial staging buffer capacity in bytes.
    pub buffer_size: usize,
    /// Dictionary window capacity in bytes; zero disables cross-group compression.
    pub window_size: usize,
    /// Log failures and per-file summaries.
    pub verbose: bool,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            verbose: false,
        }
    }
}

impl SpillConfig {
    /// Set the number of records per group.
    #[must_use]
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    /// Set the initial staging buffer capacity.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the dictionary window capacity.
    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Enable or disable diagnostic logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Staged bytes at which a group is flushed early, before reaching `group_size`.
    #[must_use]
    pub fn group_bytes_limit(&self) -> usize {
        self.window_size.max(self.buffer_size).max(1)
    }

    /// Checks that the configuration can be used to open a spill file.
    ///
    /// # Errors
    ///
    /// Returns an input error if `group_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(SpillError::input("group size must be at least 1"));
        }
        Ok(())
    }
}

/// Externally visible lifecycle state of a [`SpillFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillMode {
    /// Accepting records.
    WriteOpen,
    /// Finalized and closed; reopen with [`SpillFile::open_read`].
    WriteFinalizedClosed,
    /// Finalized with the descriptor still open; continue with [`SpillFile::begin_read`].
    WriteFinalizedOpen,
    /// Streaming records back.
    ReadOpen,
    /// No file handle; only [`SpillFile::destroy`] is useful.
    Closed,
}

/// Running counters for one spill file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpillStats {
    /// Records accepted by `write`.
    pub records_written: u64,
    /// Groups compressed and written as frames.
    pub groups_written: u64,
    /// Uncompressed group bytes written (including per-record length prefixes).
    pub bytes_written: u64,
    /// Bytes written to disk (frames and terminator).
    pub file_bytes_written: u64,
    /// Records returned by `read`.
    pub records_read: u64,
    /// Groups read and decompressed.
    pub groups_read: u64,
    /// Uncompressed group bytes read.
    pub bytes_read: u64,
    /// Bytes read from disk (frames and terminator).
    pub file_bytes_read: u64,
}

impl SpillStats {
    /// Ratio of uncompressed to on-disk bytes for the write pass.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.file_bytes_written == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / self.file_bytes_written as f64
    }
}

enum State {
    Write { frames: FrameWriter<BufWriter<File>>, encoder: Lz4StreamEncoder },
    FinalizedClosed,
    FinalizedOpen { file: File },
    Read { frames: FrameReader<BufReader<File>>, decoder: Lz4StreamDecoder },
    Closed,
}

impl State {
    fn mode(&self) -> SpillMode {
        match self {
            State::Write { .. } => SpillMode::WriteOpen,
            State::FinalizedClosed => SpillMode::WriteFinalizedClosed,
            State::FinalizedOpen { .. } => SpillMode::WriteFinalizedOpen,
            State::Read { .. } => SpillMode::ReadOpen,
            State::Closed => SpillMode::Closed,
        }
    }
}

/// A temporary, compressed, record-oriented store with a write pass and a read pass.
///
/// A spill file is used by one thread at a time. Independent spill files share nothing and
/// can be driven from separate threads.
pub struct SpillFile {
    path: PathBuf,
    config: SpillConfig,
    state: State,
    staging: StagingBuffer,
    scratch: Vec<u8>,
    stats: SpillStats,
}

impl std::fmt::Debug for SpillFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpillFile")
            .field("path", &self.path)
            .field("mode", &self.mode())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl SpillFile {
    /// Creates (or truncates) `path` and opens it for writing.
    ///
    /// # Errors
    ///
    /// Returns an input error for an invalid configuration, a memory error if the staging
    /// buffer cannot be allocated, and a file error if the file cannot be created.
    pub fn open_write<P: AsRef<Path>>(path: P, config: SpillConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let staging = StagingBuffer::with_capacity(config.buffer_size)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                SpillError::file(format!("Failed to create spill file {}", path.display()), e)
            })?;

        debug!(
            "Opened spill file {} for writing (group size {}, window {} bytes)",
            path.display(),
            config.group_size,
            config.window_size
        );

        Ok(Self {
            path,
            config,
            state: State::Write {
                frames: FrameWriter::new(BufWriter::with_capacity(IO_BUFFER_SIZE, file)),
                encoder: Lz4StreamEncoder::new(config.window_size),
            },
            staging,
            scratch: Vec::new(),
            stats: SpillStats::default(),
        })
    }

    /// Opens an existing, finalized spill file at `path` for reading.
    ///
    /// `config` must use the same window size the file was written with.
    ///
    /// # Errors
    ///
    /// Returns an input error for an invalid configuration, and a file error if the file
    /// cannot be opened.
    pub fn open_existing<P: AsRef<Path>>(path: P, config: SpillConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let staging = StagingBuffer::with_capacity(config.buffer_size)?;
        let mut spill = Self {
            path,
            config,
            state: State::FinalizedClosed,
            staging,
            scratch: Vec::new(),
            stats: SpillStats::default(),
        };
        spill.open_read(None)?;
        Ok(spill)
    }

    /// Stages one record, compressing and writing a group when it is full.
    ///
    /// # Errors
    ///
    /// Returns an input error outside [`SpillMode::WriteOpen`] or for an unencodable
    /// record, a memory error if the staging buffer cannot grow, and a file or compression
    /// error if flushing a full group fails.
    pub fn write<R: SpillRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        if !matches!(self.state, State::Write { .. }) {
            return Err(self.out_of_state("write"));
        }

        if let Err(e) = self.staging.append(record) {
            return Err(self.report("write", e));
        }
        self.stats.records_written += 1;

        if self.staging.records() >= self.config.group_size
            || self.staging.len() >= self.config.group_bytes_limit()
        {
            if let Err(e) = self.flush_group() {
                return Err(self.poison("write", e));
            }
        }
        Ok(())
    }

    /// Flushes any partial group, writes the terminator and closes the file.
    ///
    /// # Errors
    ///
    /// Returns an input error outside [`SpillMode::WriteOpen`], and a file or compression
    /// error if finalizing fails.
    pub fn close_write(&mut self) -> Result<()> {
        let file = self.finish_write("close_write")?;
        drop(file);
        self.state = State::FinalizedClosed;
        self.log_write_summary();
        Ok(())
    }

    /// Like [`close_write`](Self::close_write) but keeps the descriptor open, positioned
    /// just after the terminator, for [`begin_read`](Self::begin_read).
    ///
    /// # Errors
    ///
    /// Returns an input error outside [`SpillMode::WriteOpen`], and a file or compression
    /// error if finalizing fails.
    pub fn end_write(&mut self) -> Result<()> {
        let file = self.finish_write("end_write")?;
        self.state = State::FinalizedOpen { file };
        self.log_write_summary();
        Ok(())
    }

    /// Opens a fresh read handle on the finalized file.
    ///
    /// If `record` is given, its storage is released first so it can be reused for reading.
    ///
    /// # Errors
    ///
    /// Returns an input error unless the write pass has been finalized, and a file error if
    /// the file cannot be opened.
    pub fn open_read(&mut self, record: Option<&mut dyn SpillRecord>) -> Result<()> {
        if !matches!(self.state, State::FinalizedClosed | State::FinalizedOpen { .. }) {
            return Err(self.out_of_state("open_read"));
        }
        if let Some(record) = record {
            record.release();
        }

        // Any descriptor left open by end_write is closed in favour of the fresh one.
        self.state = State::FinalizedClosed;

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                let err = SpillError::file(
                    format!("Failed to open spill file {} for reading", self.path.display()),
                    e,
                );
                return Err(self.report("open_read", err));
            }
        };
        self.start_read(file);
        Ok(())
    }

    /// Switches a file finalized with [`end_write`](Self::end_write) to reading, rewinding
    /// the same descriptor instead of reopening it.
    ///
    /// If `record` is given, its storage is released first so it can be reused for reading.
    ///
    /// # Errors
    ///
    /// Returns an input error outside [`SpillMode::WriteFinalizedOpen`], and a file error if
    /// the descriptor cannot be rewound.
    pub fn begin_read(&mut self, record: Option<&mut dyn SpillRecord>) -> Result<()> {
        let mut file = match std::mem::replace(&mut self.state, State::Closed) {
            State::FinalizedOpen { file } => file,
            other => {
                self.state = other;
                return Err(self.out_of_state("begin_read"));
            }
        };
        if let Some(record) = record {
            record.release();
        }

        if let Err(e) = file.seek(SeekFrom::Start(0)) {
            let err = SpillError::file(
                format!("Failed to rewind spill file {}", self.path.display()),
                e,
            );
            return Err(self.report("begin_read", err));
        }
        self.start_read(file);
        Ok(())
    }

    /// Reads the next record into `record`.
    ///
    /// Returns `Some(len)` with the record's encoded length, or `None` once the terminator
    /// has been reached. `None` is returned again on every later call.
    ///
    /// # Errors
    ///
    /// Returns an input error outside [`SpillMode::ReadOpen`] or if the record cannot be
    /// decoded, and a file or compression error if the next group cannot be read.
    pub fn read<R: SpillRecord + ?Sized>(&mut self, record: &mut R) -> Result<Option<usize>> {
        let State::Read { frames, .. } = &self.state else {
            return Err(self.out_of_state("read"));
        };
        if frames.is_ended() && self.staging.is_drained() {
            return Ok(None);
        }

        while self.staging.is_drained() {
            match self.fill_group() {
                Ok(true) => {}
                Ok(false) => {
                    if self.config.verbose {
                        info!(
                            "Finished reading {} records in {} groups from {}",
                            self.stats.records_read,
                            self.stats.groups_read,
                            self.path.display()
                        );
                    }
                    return Ok(None);
                }
                Err(e) => return Err(self.poison("read", e)),
            }
        }

        let outcome = match self.staging.next_record() {
            Ok(Some(bytes)) => Ok(record.decode_from(bytes).map(|()| bytes.len())),
            Ok(None) => Err(SpillError::input("group drained unexpectedly")),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Ok(len)) => {
                self.stats.records_read += 1;
                Ok(Some(len))
            }
            Ok(Err(reason)) => {
                let err = SpillError::input(format!("Failed to decode record: {reason}"));
                Err(self.report("read", err))
            }
            Err(e) => Err(self.poison("read", e)),
        }
    }

    /// Releases all buffers, closes the file and, if `delete` is set, removes it from disk.
    ///
    /// If `record` is given, its storage is released first.
    ///
    /// # Errors
    ///
    /// Returns a file error if buffered output cannot be flushed or the file cannot be
    /// removed. The spill file is released either way.
    pub fn destroy(mut self, record: Option<&mut dyn SpillRecord>, delete: bool) -> Result<()> {
        if let Some(record) = record {
            record.release();
        }

        let mut result = Ok(());
        if let State::Write { frames, .. } = &mut self.state {
            result = frames.flush();
        }

        let Self { path, config, state, staging, scratch, stats } = self;
        drop(state);
        drop(staging);
        drop(scratch);

        if delete {
            if let Err(e) = std::fs::remove_file(&path) {
                let err = SpillError::file(format!("Failed to delete {}", path.display()), e);
                result = result.and(Err(err));
            }
        }

        if config.verbose {
            match &result {
                Ok(()) => debug!(
                    "Destroyed spill file {} ({} records written, {} read)",
                    path.display(),
                    stats.records_written,
                    stats.records_read
                ),
                Err(e) => error!("destroy failed on {}: {e}", path.display()),
            }
        }
        result
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn mode(&self) -> SpillMode {
        self.state.mode()
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration this spill file was opened with.
    #[must_use]
    pub fn config(&self) -> &SpillConfig {
        &self.config
    }

    /// Counters for the write and read passes so far.
    #[must_use]
    pub fn stats(&self) -> &SpillStats {
        &self.stats
    }

    /// Compresses the staged group and writes it as one frame.
    fn flush_group(&mut self) -> Result<()> {
        if self.staging.is_empty() {
            return Ok(());
        }
        let State::Write { frames, encoder } = &mut self.state else {
            return Err(SpillError::input("not open for writing"));
        };

        encoder.compress_group(self.staging.as_bytes(), &mut self.scratch)?;
        frames.write_frame(&self.scratch)?;

        self.stats.groups_written += 1;
        self.stats.bytes_written += self.staging.len() as u64;
        self.stats.file_bytes_written = frames.bytes();
        debug!(
            "Wrote group {} to {}: {} records, {} -> {} bytes",
            self.stats.groups_written,
            self.path.display(),
            self.staging.records(),
            self.staging.len(),
            self.scratch.len()
        );

        self.staging.reset();
        Ok(())
    }

    /// Reads and decompresses the next group into the staging buffer.
    ///
    /// Returns `false` at the terminator.
    fn fill_group(&mut self) -> Result<bool> {
        let State::Read { frames, decoder } = &mut self.state else {
            return Err(SpillError::input("not open for reading"));
        };
        if frames.is_ended() {
            return Ok(false);
        }

        let frame = frames.read_frame(&mut self.scratch);
        self.stats.file_bytes_read = frames.bytes();
        match frame? {
            Frame::End => Ok(false),
            Frame::Data(_) => {
                decoder.decompress_block(&self.scratch, self.staging.load())?;
                self.stats.groups_read += 1;
                self.stats.bytes_read += self.staging.len() as u64;
                Ok(true)
            }
        }
    }

    /// Flushes the last group, writes the terminator and hands back the flushed file.
    fn finish_write(&mut self, op: &str) -> Result<File> {
        if !matches!(self.state, State::Write { .. }) {
            return Err(self.out_of_state(op));
        }
        if let Err(e) = self.flush_group() {
            return Err(self.poison(op, e));
        }

        let State::Write { frames, .. } = std::mem::replace(&mut self.state, State::Closed)
        else {
            return Err(SpillError::input("not open for writing"));
        };

        // On failure the state is already Closed.
        Self::terminate(frames, &mut self.stats).map_err(|e| self.report(op, e))
    }

    fn terminate(
        mut frames: FrameWriter<BufWriter<File>>,
        stats: &mut SpillStats,
    ) -> Result<File> {
        frames.write_terminator()?;
        frames.flush()?;
        stats.file_bytes_written = frames.bytes();
        frames
            .into_inner()
            .into_inner()
            .map_err(|e| SpillError::file("Failed to flush spill file", e.into_error()))
    }

    fn start_read(&mut self, file: File) {
        self.staging.reset();
        self.state = State::Read {
            frames: FrameReader::new(BufReader::with_capacity(IO_BUFFER_SIZE, file)),
            decoder: Lz4StreamDecoder::new(self.config.window_size),
        };
        debug!("Opened spill file {} for reading", self.path.display());
    }

    fn out_of_state(&self, op: &str) -> SpillError {
        let err = SpillError::input(format!(
            "{op} is not allowed while the spill file is {:?}",
            self.mode()
        ));
        self.report(op, err)
    }

    /// Logs `err` when verbose and returns it.
    fn report(&self, op: &str, err: SpillError) -> SpillError {
        if self.config.verbose {
            error!("{op} failed on {}: {err}", self.path.display());
        }
        err
    }

    /// Abandons the stream after a failure that leaves the codec state untrustworthy.
    fn poison(&mut self, op: &str, err: SpillError) -> SpillError {
        self.state = State::Closed;
        self.staging.reset();
        self.report(op, err)
    }

    fn log_write_summary(&self) {
        if self.config.verbose {
            info!(
                "Finalized spill file {}: {} records in {} groups, {} -> {} bytes ({:.2}x)",
                self.path.display(),
                self.stats.records_written,
                self.stats.groups_written,
                self.stats.bytes_written,
                self.stats.file_bytes_written,
                self.stats.compression_ratio()
            );
        }
    }
}
