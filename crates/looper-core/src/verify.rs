//! Copy one settled file and verify the destination bytes.
//!
//! Strictly sequential: (record intent) → checksum source → copy → checksum
//! destination → compare (→ record). A mismatch is returned as
//! [`LooperError::ChecksumMismatch`]; nothing is retried or rolled back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::{self, Checksum};
use crate::config::RecordOrder;
use crate::error::{LooperError, Result};
use crate::ledger::Ledger;
use crate::report::{CycleEvent, Reporter};

/// Puts the bytes of `source` at `destination`.
pub trait FileCopier: Send + Sync {
    fn copy(&self, source: &Path, destination: &Path) -> std::io::Result<u64>;
}

/// `std::fs::copy`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, source: &Path, destination: &Path) -> std::io::Result<u64> {
        fs::copy(source, destination)
    }
}

/// A verified copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
    pub checksum: Checksum,
}

pub struct CopyVerifier<C = FsCopier> {
    to_dir: PathBuf,
    order: RecordOrder,
    copier: C,
}

impl CopyVerifier<FsCopier> {
    pub fn new(to_dir: impl Into<PathBuf>, order: RecordOrder) -> Self {
        Self::with_copier(to_dir, order, FsCopier)
    }
}

impl<C: FileCopier> CopyVerifier<C> {
    pub fn with_copier(to_dir: impl Into<PathBuf>, order: RecordOrder, copier: C) -> Self {
        Self {
            to_dir: to_dir.into(),
            order,
            copier,
        }
    }

    pub fn record_order(&self) -> RecordOrder {
        self.order
    }

    /// Destination for a source file: same file name inside the target directory.
    pub fn destination_for(&self, file_name: &str) -> PathBuf {
        self.to_dir.join(file_name)
    }

    /// Copy `source` (recorded in the ledger as `key`) and verify it.
    pub fn copy_and_verify(
        &self,
        source: &Path,
        key: &str,
        file_name: &str,
        ledger: &mut Ledger,
        reporter: &dyn Reporter,
    ) -> Result<CopyOutcome> {
        if self.order == RecordOrder::BeforeCopy {
            record(ledger, key, reporter)?;
        }

        let expected = checksum::sha256_path(source)?;
        reporter.report(&CycleEvent::SourceChecksum {
            path: source.to_path_buf(),
            checksum: expected.to_string(),
        });

        let destination = self.destination_for(file_name);
        let bytes = self
            .copier
            .copy(source, &destination)
            .map_err(|e| LooperError::Copy {
                source_path: source.to_path_buf(),
                destination: destination.clone(),
                source: e,
            })?;

        let actual = checksum::sha256_path(&destination)?;
        reporter.report(&CycleEvent::DestinationChecksum {
            path: destination.clone(),
            checksum: actual.to_string(),
        });

        if expected != actual {
            reporter.report(&CycleEvent::Mismatch {
                path: source.to_path_buf(),
                destination: destination.clone(),
            });
            return Err(LooperError::ChecksumMismatch {
                source_path: source.to_path_buf(),
                destination,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        reporter.report(&CycleEvent::Verified {
            path: source.to_path_buf(),
            destination: destination.clone(),
        });

        if self.order == RecordOrder::AfterVerify {
            record(ledger, key, reporter)?;
        }

        Ok(CopyOutcome {
            source: source.to_path_buf(),
            destination,
            bytes,
            checksum: actual,
        })
    }
}

fn record(ledger: &mut Ledger, key: &str, reporter: &dyn Reporter) -> Result<()> {
    ledger.record(key)?;
    reporter.report(&CycleEvent::Recorded {
        path: PathBuf::from(key),
    });
    Ok(())
}
