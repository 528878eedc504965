//! Stability probe: is a file's size unchanged across a sampling delay?
//!
//! This is the only readiness signal available without filesystem events.
//! A writer that pauses longer than the delay looks finished, and a file
//! being appended looks busy; both are accepted.

use std::fs;
use std::path::Path;
use std::time::Duration;

/// Sizes taken before and after the sampling delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilitySample {
    pub before: u64,
    pub after: u64,
}

impl StabilitySample {
    pub fn is_stable(&self) -> bool {
        self.before == self.after
    }
}

/// Blocks the calling thread between the two size reads.
pub trait Pause: Send + Sync {
    fn pause(&self, delay: Duration);
}

/// Production [`Pause`]: `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

impl<F> Pause for F
where
    F: Fn(Duration) + Send + Sync,
{
    fn pause(&self, delay: Duration) {
        self(delay)
    }
}

pub struct StabilityProbe<P = ThreadSleep> {
    delay: Duration,
    pause: P,
}

impl StabilityProbe<ThreadSleep> {
    pub fn new(delay: Duration) -> Self {
        Self::with_pause(delay, ThreadSleep)
    }
}

impl<P: Pause> StabilityProbe<P> {
    pub fn with_pause(delay: Duration, pause: P) -> Self {
        Self { delay, pause }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Take both size samples. `None` if either read fails (file deleted or
    /// moved mid-check).
    pub fn sample(&self, path: &Path) -> Option<StabilitySample> {
        let before = file_size(path)?;
        self.pause.pause(self.delay);
        let after = file_size(path)?;
        Some(StabilitySample { before, after })
    }

    /// Ready iff both reads succeed and the sizes are equal.
    pub fn is_ready(&self, path: &Path) -> bool {
        self.sample(path).is_some_and(|s| s.is_stable())
    }
}

fn file_size(path: &Path) -> Option<u64> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "size read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn unchanged_file_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, vec![7u8; 500]).unwrap();

        let probe = StabilityProbe::with_pause(Duration::from_secs(1), |_d: Duration| {});
        assert_eq!(
            probe.sample(&path),
            Some(StabilitySample {
                before: 500,
                after: 500
            })
        );
        assert!(probe.is_ready(&path));
    }

    #[test]
    fn growing_file_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.bin");
        fs::write(&path, b"partial").unwrap();

        let grow_path = path.clone();
        let probe = StabilityProbe::with_pause(Duration::from_secs(1), move |_d: Duration| {
            let mut f = fs::OpenOptions::new().append(true).open(&grow_path).unwrap();
            f.write_all(b" more bytes").unwrap();
        });
        let sample = probe.sample(&path).unwrap();
        assert!(!sample.is_stable());
        assert_eq!(sample.before, 7);
        assert!(!probe.is_ready(&path));
    }

    #[test]
    fn vanished_file_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.bin");
        fs::write(&path, b"x").unwrap();

        let doomed = path.clone();
        let probe = StabilityProbe::with_pause(Duration::ZERO, move |_d: Duration| {
            let _ = fs::remove_file(&doomed);
        });
        assert_eq!(probe.sample(&path), None);

        let never_existed = dir.path().join("never.bin");
        assert!(!probe.is_ready(&never_existed));
    }

    #[test]
    fn pause_receives_configured_delay_once_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"abc").unwrap();

        let calls = AtomicU32::new(0);
        let probe = StabilityProbe::with_pause(Duration::from_millis(250), |d: Duration| {
            assert_eq!(d, Duration::from_millis(250));
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert!(probe.is_ready(&path));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn thread_sleep_waits_at_least_the_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"abc").unwrap();

        let probe = StabilityProbe::new(Duration::from_millis(20));
        let start = std::time::Instant::now();
        assert!(probe.is_ready(&path));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
