//! Checksum of a file's full contents, computed on both ends of every copy.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{LooperError, Result};

const BUF_SIZE: usize = 64 * 1024;

/// Lowercase hex SHA-256 digest. Only compared for equality, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 of the file's current contents. Called once on the source and
/// once on the destination of every copy; the two digests must be equal.
pub fn sha256_path(path: &Path) -> Result<Checksum> {
    let mut f = File::open(path)
        .map_err(|e| LooperError::io(format!("open {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .map_err(|e| LooperError::io(format!("read {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Checksum(hex::encode(hasher.finalize())))
}
