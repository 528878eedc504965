//! `looper checksum <path>` – print the SHA-256 of a file.

use anyhow::Result;
use looper_core::checksum;
use std::path::Path;

pub fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
