//! One pass over the watched directory.
//!
//! Entries are visited in the order the filesystem lists them. For each:
//! skip if recorded, skip directories, probe stability, copy and verify.
//! Files that are not ready are left alone and looked at again next cycle;
//! nothing is recorded for them.
//!
//! With a stop token attached the cycle ends at the next entry boundary
//! once the token is set. A copy that has started always finishes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{LooperConfig, RecordOrder};
use crate::error::{LooperError, Result};
use crate::ledger::{ArrivalLedger, Ledger};
use crate::probe::{Pause, StabilityProbe, ThreadSleep};
use crate::report::{CycleEvent, Reporter};
use crate::stop::StopToken;
use crate::verify::{CopyOutcome, CopyVerifier, FileCopier, FsCopier};

/// What a single cycle did.
#[derive(Debug, Default, Clone)]
pub struct CycleSummary {
    /// Directory entries listed.
    pub seen: usize,
    pub already_recorded: usize,
    pub not_ready: usize,
    /// Directories, names the ledger cannot hold and unreadable entries.
    pub skipped: usize,
    pub copies: Vec<CopyOutcome>,
    /// The stop token ended the cycle before every entry was visited.
    pub interrupted: bool,
}

impl CycleSummary {
    pub fn copied(&self) -> usize {
        self.copies.len()
    }

    pub fn bytes_copied(&self) -> u64 {
        self.copies.iter().map(|c| c.bytes).sum()
    }
}

/// The copy engine: watched directory, probe, verifier, ledger and reporter.
pub struct Looper<P = ThreadSleep, C = FsCopier> {
    from_dir: PathBuf,
    probe: StabilityProbe<P>,
    verifier: CopyVerifier<C>,
    ledger: Ledger,
    reporter: Arc<dyn Reporter>,
    stop: Option<StopToken>,
}

impl Looper<StopToken, FsCopier> {
    /// Build from a loaded config. With `ledger_index` set the ledger file
    /// is read once here. `stop` both cuts the stability pause short and
    /// ends a cycle at the next entry boundary.
    pub fn from_config(
        cfg: &LooperConfig,
        reporter: Arc<dyn Reporter>,
        stop: StopToken,
    ) -> Result<Self> {
        if cfg.settings.record_order == RecordOrder::BeforeCopy {
            reporter.report(&CycleEvent::LegacyRecordOrder);
        }
        let file = ArrivalLedger::new(&cfg.paths.logfile);
        let ledger = if cfg.settings.ledger_index {
            Ledger::indexed(file, reporter.as_ref())?
        } else {
            Ledger::scanning(file)
        };
        Ok(Self::new(
            &cfg.paths.from_path,
            StabilityProbe::with_pause(cfg.settings.sleep_duration(), stop.clone()),
            CopyVerifier::new(&cfg.paths.to_path, cfg.settings.record_order),
            ledger,
            reporter,
        )
        .with_stop(stop))
    }
}

impl<P: Pause, C: FileCopier> Looper<P, C> {
    pub fn new(
        from_dir: impl Into<PathBuf>,
        probe: StabilityProbe<P>,
        verifier: CopyVerifier<C>,
        ledger: Ledger,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            from_dir: from_dir.into(),
            probe,
            verifier,
            ledger,
            reporter,
            stop: None,
        }
    }

    /// End cycles early once `stop` is set.
    pub fn with_stop(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(StopToken::is_stopped)
    }

    pub fn from_dir(&self) -> &Path {
        &self.from_dir
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Process every currently unrecorded, currently ready entry once.
    ///
    /// Per-entry read failures are reported and skipped. Ledger failures,
    /// copy failures and checksum mismatches end the cycle with an error.
    pub fn run_cycle(&mut self) -> Result<CycleSummary> {
        let entries = fs::read_dir(&self.from_dir).map_err(|e| {
            LooperError::io(format!("list {}", self.from_dir.display()), e)
        })?;

        let mut summary = CycleSummary::default();
        for entry in entries {
            if self.stopped() {
                summary.interrupted = true;
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.reporter.report(&CycleEvent::EntryUnreadable {
                        path: self.from_dir.clone(),
                        error: e.to_string(),
                    });
                    summary.skipped += 1;
                    continue;
                }
            };
            summary.seen += 1;
            let path = entry.path();

            let file_name = entry.file_name();
            let (Some(name), Some(key)) = (file_name.to_str(), path.to_str()) else {
                self.reporter.report(&CycleEvent::SkippedNonUtf8 { path: path.clone() });
                summary.skipped += 1;
                continue;
            };
            // A line break would split the ledger record and the name could
            // never match, so the file would be copied again every cycle.
            if key.contains(['\n', '\r']) {
                self.reporter.report(&CycleEvent::SkippedUnrecordable { path: path.clone() });
                summary.skipped += 1;
                continue;
            }

            if self.ledger.contains(key, self.reporter.as_ref())? {
                self.reporter.report(&CycleEvent::AlreadyRecorded { path: path.clone() });
                summary.already_recorded += 1;
                continue;
            }

            // Follows symlinks, so a link to a directory is skipped too.
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    self.reporter.report(&CycleEvent::SkippedDirectory { path: path.clone() });
                    summary.skipped += 1;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    self.reporter.report(&CycleEvent::EntryUnreadable {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    summary.skipped += 1;
                    continue;
                }
            }

            self.reporter.report(&CycleEvent::NewArrival { path: path.clone() });
            self.reporter.report(&CycleEvent::Probing {
                path: path.clone(),
                delay: self.probe.delay(),
            });
            let sample = self.probe.sample(&path);
            if self.stopped() {
                // The pause may have been cut short; the sample proves nothing.
                summary.interrupted = true;
                break;
            }
            match sample {
                Some(sample) if sample.is_stable() => {
                    self.reporter.report(&CycleEvent::Ready {
                        path: path.clone(),
                        size: sample.after,
                    });
                }
                sample => {
                    self.reporter.report(&CycleEvent::NotReady {
                        path: path.clone(),
                        sample,
                    });
                    summary.not_ready += 1;
                    continue;
                }
            }

            let outcome = self.verifier.copy_and_verify(
                &path,
                key,
                name,
                &mut self.ledger,
                self.reporter.as_ref(),
            )?;
            summary.copies.push(outcome);
        }

        tracing::debug!(
            seen = summary.seen,
            copied = summary.copied(),
            not_ready = summary.not_ready,
            already_recorded = summary.already_recorded,
            skipped = summary.skipped,
            "scan cycle finished"
        );
        if summary.interrupted {
            self.reporter.report(&CycleEvent::CycleInterrupted);
        }
        Ok(summary)
    }
}
