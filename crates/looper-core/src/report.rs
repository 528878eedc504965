//! Progress reporting for the copy engine.
//!
//! Components never log directly; they hand a [`CycleEvent`] to the
//! [`Reporter`] they were built with. The daemon uses [`TracingReporter`];
//! tests and embedders can collect events with [`MemoryReporter`].

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::probe::StabilitySample;

/// Something that happened while scanning or copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// Ledger file is absent; treated as empty.
    LedgerMissing { ledger: PathBuf },
    /// Entry is already in the ledger; nothing to do.
    AlreadyRecorded { path: PathBuf },
    /// Entry not yet in the ledger.
    NewArrival { path: PathBuf },
    /// Entry is a directory and is never copied.
    SkippedDirectory { path: PathBuf },
    /// Entry name is not valid UTF-8 and cannot be recorded in the ledger.
    SkippedNonUtf8 { path: PathBuf },
    /// Entry name contains a line break, which a ledger line cannot hold.
    SkippedUnrecordable { path: PathBuf },
    /// Directory entry or its metadata could not be read; retried next cycle.
    EntryUnreadable { path: PathBuf, error: String },
    /// Stability probe started.
    Probing { path: PathBuf, delay: Duration },
    /// Size changed (or could not be read) across the sampling window.
    NotReady {
        path: PathBuf,
        sample: Option<StabilitySample>,
    },
    /// Size was stable; the file will be copied.
    Ready { path: PathBuf, size: u64 },
    SourceChecksum { path: PathBuf, checksum: String },
    DestinationChecksum { path: PathBuf, checksum: String },
    /// Digests matched.
    Verified { path: PathBuf, destination: PathBuf },
    /// Digests differ; the daemon is about to stop.
    Mismatch { path: PathBuf, destination: PathBuf },
    /// Source path appended to the ledger.
    Recorded { path: PathBuf },
    /// Poller finished a cycle and is pausing before the next.
    Waiting,
    /// Stop was requested; the cycle ended before visiting every entry.
    CycleInterrupted,
    /// Built with `record_order = "before-copy"`: a crash mid-copy leaves
    /// the file recorded but uncopied.
    LegacyRecordOrder,
}

/// Observer for [`CycleEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &CycleEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &CycleEvent) {}
}

/// Emits events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &CycleEvent) {
        match event {
            CycleEvent::LedgerMissing { ledger } => {
                tracing::warn!(ledger = %ledger.display(), "ledger file does not exist yet, treating as empty")
            }
            CycleEvent::AlreadyRecorded { path } => {
                tracing::trace!(path = %path.display(), "already copied")
            }
            CycleEvent::NewArrival { path } => {
                tracing::info!(path = %path.display(), "new file arrived")
            }
            CycleEvent::SkippedDirectory { path } => {
                tracing::debug!(path = %path.display(), "skipping directory entry")
            }
            CycleEvent::SkippedNonUtf8 { path } => {
                tracing::warn!(path = %path.display(), "skipping entry with non UTF-8 name")
            }
            CycleEvent::SkippedUnrecordable { path } => tracing::warn!(
                path = ?path,
                "skipping entry whose name contains a line break; it cannot be recorded in the ledger"
            ),
            CycleEvent::EntryUnreadable { path, error } => {
                tracing::warn!(path = %path.display(), %error, "could not read directory entry")
            }
            CycleEvent::Probing { path, delay } => tracing::info!(
                path = %path.display(),
                delay_ms = delay.as_millis() as u64,
                "checking whether file is ready for copy"
            ),
            CycleEvent::NotReady { path, sample } => match sample {
                Some(s) => tracing::info!(
                    path = %path.display(),
                    before = s.before,
                    after = s.after,
                    "file still growing, will retry"
                ),
                None => tracing::info!(path = %path.display(), "file size unreadable, will retry"),
            },
            CycleEvent::Ready { path, size } => {
                tracing::info!(path = %path.display(), size, "ready to copy")
            }
            CycleEvent::SourceChecksum { path, checksum } => {
                tracing::info!(path = %path.display(), %checksum, "checksum of source file")
            }
            CycleEvent::DestinationChecksum { path, checksum } => {
                tracing::info!(path = %path.display(), %checksum, "checksum of destination file")
            }
            CycleEvent::Verified { path, destination } => tracing::info!(
                path = %path.display(),
                destination = %destination.display(),
                "checksums match"
            ),
            CycleEvent::Mismatch { path, destination } => tracing::error!(
                path = %path.display(),
                destination = %destination.display(),
                "checksums do not match, aborting"
            ),
            CycleEvent::Recorded { path } => {
                tracing::debug!(path = %path.display(), "recorded in ledger")
            }
            CycleEvent::Waiting => tracing::debug!("waiting for new files"),
            CycleEvent::CycleInterrupted => tracing::info!("stop requested, ending scan cycle early"),
            CycleEvent::LegacyRecordOrder => tracing::warn!(
                "ledger records are written before the copy is verified; \
                 a crash mid-copy leaves the file recorded but uncopied \
                 (set settings.record_order = \"after-verify\" to record only verified copies)"
            ),
        }
    }
}

/// Collects events in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<CycleEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event reported so far.
    pub fn events(&self) -> Vec<CycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Drain collected events.
    pub fn take(&self) -> Vec<CycleEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &CycleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
