//! Outer poll loop: run a scan cycle, pause, repeat until stopped.
//!
//! The stop token is checked between cycles and during the pause. Inside a
//! cycle it is only seen if the looper was built with it (see
//! [`Looper::with_stop`]).

use std::time::Duration;

use crate::error::Result;
use crate::probe::Pause;
use crate::report::CycleEvent;
use crate::scan::Looper;
use crate::verify::FileCopier;

pub use crate::stop::StopToken;

/// Totals over every cycle the loop ran.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollStats {
    pub cycles: u64,
    pub copied: u64,
    pub bytes: u64,
}

/// Run cycles until `stop` is set or a cycle fails. Errors are returned
/// as-is; the caller decides how to exit.
pub fn run_until_stopped<P: Pause, C: FileCopier>(
    looper: &mut Looper<P, C>,
    cycle_pause: Duration,
    stop: &StopToken,
) -> Result<PollStats> {
    let mut stats = PollStats::default();
    while !stop.is_stopped() {
        let summary = looper.run_cycle()?;
        stats.cycles += 1;
        stats.copied += summary.copied() as u64;
        stats.bytes += summary.bytes_copied();
        looper.reporter().report(&CycleEvent::Waiting);
        stop.sleep(cycle_pause);
    }
    tracing::info!(
        cycles = stats.cycles,
        copied = stats.copied,
        bytes = stats.bytes,
        "poll loop stopped"
    );
    Ok(stats)
}
