//! `looper run` – watch the source directory until Ctrl-C.
//!
//! The engine is blocking; it runs on a blocking thread while the runtime
//! waits for Ctrl-C and flips the stop token. The engine stops at the next
//! file boundary; a copy in progress finishes first. A second Ctrl-C exits
//! immediately.

use anyhow::Result;
use looper_core::config::LooperConfig;
use looper_core::poller::{self, StopToken};
use looper_core::report::{Reporter, TracingReporter};
use looper_core::Looper;
use std::sync::Arc;

/// Conventional exit status for a process ended by SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn watch_ctrl_c(stop: StopToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("interrupt received, stopping at the next file boundary");
        println!("Interrupted, finishing the current file (Ctrl-C again to exit now)...");
        stop.stop();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second interrupt received, exiting without waiting");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

pub async fn run_loop(cfg: LooperConfig, once: bool) -> Result<()> {
    let stop = StopToken::new();
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);
    let mut looper = Looper::from_config(&cfg, reporter, stop.clone())?;
    watch_ctrl_c(stop.clone());

    tracing::info!(
        from = %cfg.paths.from_path.display(),
        to = %cfg.paths.to_path.display(),
        ledger = %cfg.paths.logfile.display(),
        sleeptime = cfg.settings.sleeptime,
        "copying files as they arrive"
    );
    println!(
        "Copying files from {} to {}, checking interval {} s",
        cfg.paths.from_path.display(),
        cfg.paths.to_path.display(),
        cfg.settings.sleeptime
    );

    if once {
        let summary = tokio::task::spawn_blocking(move || looper.run_cycle()).await??;
        println!(
            "{} copied ({} bytes), {} not ready, {} already copied, {} skipped",
            summary.copied(),
            summary.bytes_copied(),
            summary.not_ready,
            summary.already_recorded,
            summary.skipped
        );
        if summary.interrupted {
            println!("Cycle interrupted before every file was checked");
        }
        return Ok(());
    }

    let pause = cfg.settings.cycle_pause();
    let stats = tokio::task::spawn_blocking(move || {
        poller::run_until_stopped(&mut looper, pause, &stop)
    })
    .await??;

    println!(
        "Stopped after {} cycle(s): {} file(s) copied, {} bytes",
        stats.cycles, stats.copied, stats.bytes
    );
    Ok(())
}
