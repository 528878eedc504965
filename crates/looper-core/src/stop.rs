//! Cooperative stop flag shared between the signal handler and the engine.
//!
//! The scan cycle checks it at entry boundaries and the stability pause wakes
//! on it, so an interrupt takes effect within [`STOP_POLL`] unless a copy
//! is in progress. A copy always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::probe::Pause;

pub const STOP_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep for `total` in [`STOP_POLL`] slices, returning early once stopped.
    pub fn sleep(&self, total: Duration) {
        let deadline = Instant::now() + total;
        loop {
            if self.is_stopped() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep((deadline - now).min(STOP_POLL));
        }
    }
}

/// Stability pause that gives up as soon as the token is set. The scan cycle
/// discards a sample taken across a cut-short pause.
impl Pause for StopToken {
    fn pause(&self, delay: Duration) {
        self.sleep(delay);
    }
}
