//! Error type for the copy engine.
//!
//! Per-file transient failures (a file vanishing mid-probe, an unreadable
//! directory entry) never reach this type; the scan cycle reports and skips
//! them. Everything here stops the daemon.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = LooperError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LooperError {
    /// Ledger, directory listing or checksum read failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Copying the bytes to the destination failed (disk full, permission
    /// denied, destination directory missing).
    #[error("copy {} -> {}: {source}", source_path.display(), destination.display())]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination bytes do not hash to the source digest. Never retried.
    #[error(
        "checksum mismatch for {}: source {expected}, destination {actual} ({})",
        source_path.display(),
        destination.display()
    )]
    ChecksumMismatch {
        source_path: PathBuf,
        destination: PathBuf,
        expected: String,
        actual: String,
    },

    /// The record contains a line break and would not read back as one line.
    #[error("cannot record {record:?} in the ledger: name contains a line break")]
    Unrecordable { record: String },
}

impl LooperError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        LooperError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for integrity violations, which the binary maps to a distinct exit code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LooperError::ChecksumMismatch { .. })
    }
}
