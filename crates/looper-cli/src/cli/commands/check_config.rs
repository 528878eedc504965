//! `looper check-config` – validate the config and show what `run` would use.

use anyhow::Result;
use looper_core::config::{self, RecordOrder};
use std::path::Path;

pub fn run_check_config(path: &Path) -> Result<()> {
    let cfg = config::load_from(path)?;
    println!("Config file is good: {}", path.display());
    println!("  from_path        {}", cfg.paths.from_path.display());
    println!("  to_path          {}", cfg.paths.to_path.display());
    println!("  logfile          {}", cfg.paths.logfile.display());
    println!("  sleeptime        {} s", cfg.settings.sleeptime);
    println!("  cycle_pause_secs {} s", cfg.settings.cycle_pause_secs);
    println!(
        "  record_order     {}",
        match cfg.settings.record_order {
            RecordOrder::BeforeCopy => "before-copy",
            RecordOrder::AfterVerify => "after-verify",
        }
    );
    println!("  ledger_index     {}", cfg.settings.ledger_index);

    for (what, dir) in [("from_path", &cfg.paths.from_path), ("to_path", &cfg.paths.to_path)] {
        if !dir.is_dir() {
            println!("warning: {what} {} is not an existing directory", dir.display());
        }
    }
    Ok(())
}
