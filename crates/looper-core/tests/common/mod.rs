//! Shared fixture: a watched dir, a destination dir and a ledger path in one tempdir.

use looper_core::config::RecordOrder;
use looper_core::ledger::{ArrivalLedger, Ledger};
use looper_core::probe::StabilityProbe;
use looper_core::report::MemoryReporter;
use looper_core::verify::{CopyVerifier, FileCopier};
use looper_core::Looper;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct Dirs {
    _root: tempfile::TempDir,
    pub from: PathBuf,
    pub to: PathBuf,
    pub ledger: PathBuf,
}

impl Dirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let from = root.path().join("incoming");
        let to = root.path().join("archive");
        fs::create_dir(&from).unwrap();
        fs::create_dir(&to).unwrap();
        let ledger = root.path().join("copied.txt");
        Self {
            _root: root,
            from,
            to,
            ledger,
        }
    }

    pub fn put(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.from.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Ledger key for a file in the watched dir.
    pub fn key(&self, name: &str) -> String {
        self.from.join(name).to_str().unwrap().to_owned()
    }

    pub fn ledger_text(&self) -> String {
        fs::read_to_string(&self.ledger).unwrap_or_default()
    }
}

/// Appends to `target` every time the probe pauses, so `target` is always
/// growing during its own sampling window.
pub fn grow_during_pause(target: PathBuf) -> impl Fn(Duration) + Send + Sync {
    move |_d: Duration| {
        let mut f = fs::OpenOptions::new().append(true).open(&target).unwrap();
        f.write_all(b"more").unwrap();
    }
}

pub fn no_pause(_: Duration) {}

/// `std::fs::copy` that counts calls.
#[derive(Default, Clone)]
pub struct CountingCopier(pub Arc<AtomicUsize>);

impl CountingCopier {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FileCopier for CountingCopier {
    fn copy(&self, source: &Path, destination: &Path) -> std::io::Result<u64> {
        self.0.fetch_add(1, Ordering::SeqCst);
        fs::copy(source, destination)
    }
}

/// Copies, then corrupts the destination before it is checksummed.
pub struct CorruptingCopier;

impl FileCopier for CorruptingCopier {
    fn copy(&self, source: &Path, destination: &Path) -> std::io::Result<u64> {
        let n = fs::copy(source, destination)?;
        let mut f = fs::OpenOptions::new().append(true).open(destination)?;
        f.write_all(b"!")?;
        Ok(n)
    }
}

/// Fails every copy, as if the process died mid-transfer.
pub struct FailingCopier;

impl FileCopier for FailingCopier {
    fn copy(&self, _source: &Path, _destination: &Path) -> std::io::Result<u64> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
    }
}

pub fn looper<P, C>(
    dirs: &Dirs,
    pause: P,
    copier: C,
    order: RecordOrder,
    reporter: Arc<MemoryReporter>,
) -> Looper<P, C>
where
    P: looper_core::probe::Pause,
    C: FileCopier,
{
    Looper::new(
        &dirs.from,
        StabilityProbe::with_pause(Duration::from_secs(1), pause),
        CopyVerifier::with_copier(&dirs.to, order, copier),
        Ledger::scanning(ArrivalLedger::new(&dirs.ledger)),
        reporter,
    )
}
