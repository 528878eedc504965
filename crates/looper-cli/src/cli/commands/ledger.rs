//! `looper ledger` – list source paths recorded as copied.

use anyhow::Result;
use looper_core::config::LooperConfig;
use looper_core::ledger::ArrivalLedger;

pub fn run_ledger(cfg: &LooperConfig) -> Result<()> {
    let ledger = ArrivalLedger::new(&cfg.paths.logfile);
    let records = ledger.records()?;
    if records.is_empty() {
        println!("No files recorded in {}.", ledger.path().display());
    } else {
        for r in &records {
            println!("{r}");
        }
        println!("{} file(s) recorded in {}", records.len(), ledger.path().display());
    }
    Ok(())
}
