//! `looper init-config [path]` – write a template config.

use anyhow::Result;
use looper_core::config;
use std::path::Path;

pub fn run_init_config(path: &Path) -> Result<()> {
    config::write_template(path)?;
    println!("Wrote config template to {}", path.display());
    println!("Edit [paths] before running `looper run --config {}`.", path.display());
    Ok(())
}
