//! Custom error types for samspill operations.
//!
//! Two families of errors live here:
//!
//! - [`SpillError`] is returned by every spill file operation. Its [`ErrorKind`] is the
//!   closed status taxonomy callers dispatch on (memory, file, compression, input).
//! - [`SamspillError`] covers parameter and file validation in front of the spill core.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Result type alias for spill file operations.
pub type Result<T> = std::result::Result<T, SpillError>;

/// The category of a [`SpillError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An allocation could not be satisfied.
    Memory,
    /// Opening, reading, writing, seeking or removing the backing file failed.
    File,
    /// A block could not be compressed or decompressed, or failed its checksum.
    Compression,
    /// An operation was called in the wrong mode or was given malformed input.
    Input,
}

/// Error type for spill file operations.
#[derive(Error, Debug)]
pub enum SpillError {
    /// Buffer growth failed.
    #[error("Failed to allocate {requested} bytes for {buffer}")]
    Memory {
        /// Name of the buffer that was growing
        buffer: &'static str,
        /// Number of additional bytes requested
        requested: usize,
        /// Underlying allocation error
        #[source]
        source: TryReserveError,
    },

    /// I/O on the backing file failed, including short reads and writes.
    #[error("{context}: {source}")]
    File {
        /// What was being attempted
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Encoding or decoding a compressed block failed.
    #[error("Compression error: {reason}")]
    Compression {
        /// Explanation of the failure
        reason: String,
    },

    /// Illegal call for the current mode, or malformed input.
    #[error("Invalid input: {reason}")]
    Input {
        /// Explanation of the problem
        reason: String,
    },
}

impl SpillError {
    /// Returns the status category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpillError::Memory { .. } => ErrorKind::Memory,
            SpillError::File { .. } => ErrorKind::File,
            SpillError::Compression { .. } => ErrorKind::Compression,
            SpillError::Input { .. } => ErrorKind::Input,
        }
    }

    pub(crate) fn file(context: impl Into<String>, source: io::Error) -> Self {
        SpillError::File { context: context.into(), source }
    }

    pub(crate) fn compression(reason: impl Into<String>) -> Self {
        SpillError::Compression { reason: reason.into() }
    }

    pub(crate) fn input(reason: impl Into<String>) -> Self {
        SpillError::Input { reason: reason.into() }
    }
}

/// Reserves `additional` bytes in `buf`, mapping allocation failure to [`SpillError::Memory`].
pub(crate) fn try_grow(buf: &mut Vec<u8>, additional: usize, name: &'static str) -> Result<()> {
    buf.try_reserve(additional).map_err(|source| SpillError::Memory {
        buffer: name,
        requested: additional,
        source,
    })
}

/// Error type for validation in front of the spill core.
#[derive(Error, Debug)]
pub enum SamspillError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "spill")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },
}
