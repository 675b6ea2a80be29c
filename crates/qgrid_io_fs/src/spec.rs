//! Write state models and top-level error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Lifecycle of one [`crate::ChunkedWriter`].
///
/// `Idle -> Writing(offset) -> {Done | Failed | Cancelled}`; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWriteState {
    /// Nothing written yet.
    Idle,
    /// File open; the next slice starts at `n_offset`.
    Writing {
        /// Byte offset of the next slice.
        n_offset: u64,
    },
    /// Every byte written and the handle closed.
    Done,
    /// An open, write or close call failed.
    Failed,
    /// Stopped by a cancellation request.
    Cancelled,
}

impl EnumWriteState {
    /// Whether no further step will run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for EnumWriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Writing { n_offset } => write!(f, "writing({n_offset})"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of one [`crate::ChunkedWriter::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWriteStep {
    /// Target opened for slice writes.
    Opened,
    /// Bytes were written.
    Progress {
        /// Bytes written so far.
        n_written: u64,
        /// Payload size.
        n_total: u64,
    },
    /// Writer already reached a terminal state.
    Finished,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failure of one write operation.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Target could not be opened.
    #[error("Failed to open {}: {message}", .path.display())]
    Open {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// A write call failed; bytes before `offset` stay on disk.
    #[error("Failed to write {} at offset {offset}: {message}", .path.display())]
    Write {
        /// Target path.
        path: PathBuf,
        /// Offset of the failed write.
        offset: u64,
        /// Underlying IO error text.
        message: String,
    },
    /// Closing the handle after the last slice failed.
    #[error("Failed to close {}: {message}", .path.display())]
    Close {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// A newer write or an explicit cancel stopped this one.
    #[error("Write to {} cancelled after {n_bytes_written} bytes", .path.display())]
    Cancelled {
        /// Target path.
        path: PathBuf,
        /// Bytes already on disk.
        n_bytes_written: u64,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
