//! Append-only ledger of source paths that have been copied.
//!
//! Plain text, one source path per line. The file is only ever opened in
//! append mode for writing, so records are never rewritten or compacted.
//! A missing ledger file is an empty ledger; it is created by the first
//! append.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{LooperError, Result};
use crate::report::{CycleEvent, Reporter};

#[derive(Debug, Clone)]
pub struct ArrivalLedger {
    path: PathBuf,
}

impl ArrivalLedger {
    /// Ledger backed by `path`. Performs no I/O.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff some record equals `source` exactly. Scans the whole file.
    /// A CRLF line ending is not part of the record.
    pub fn contains(&self, source: &str, reporter: &dyn Reporter) -> Result<bool> {
        let Some(text) = self.read_text()? else {
            reporter.report(&CycleEvent::LedgerMissing {
                ledger: self.path.clone(),
            });
            return Ok(false);
        };
        Ok(text.lines().any(|line| line == source))
    }

    /// Append one record and sync it to disk before returning.
    pub fn append(&self, source: &str) -> Result<()> {
        if source.contains(['\n', '\r']) {
            return Err(LooperError::Unrecordable {
                record: source.to_owned(),
            });
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LooperError::io(format!("open ledger {}", self.path.display()), e))?;
        let mut record = String::with_capacity(source.len() + 1);
        record.push_str(source);
        record.push('\n');
        f.write_all(record.as_bytes())
            .and_then(|()| f.flush())
            .and_then(|()| f.sync_data())
            .map_err(|e| LooperError::io(format!("append to ledger {}", self.path.display()), e))
    }

    /// Every record in file order. Empty if the ledger does not exist.
    pub fn records(&self) -> Result<Vec<String>> {
        Ok(self
            .read_text()?
            .map(|text| text.lines().map(str::to_owned).collect())
            .unwrap_or_default())
    }

    /// Build an in-memory index of the current records.
    pub fn load_index(&self, reporter: &dyn Reporter) -> Result<LedgerIndex> {
        let Some(text) = self.read_text()? else {
            reporter.report(&CycleEvent::LedgerMissing {
                ledger: self.path.clone(),
            });
            return Ok(LedgerIndex::default());
        };
        Ok(LedgerIndex {
            seen: text.lines().map(str::to_owned).collect(),
        })
    }

    /// Append a record and mirror it into `index`.
    pub fn append_indexed(&self, index: &mut LedgerIndex, source: &str) -> Result<()> {
        self.append(source)?;
        index.seen.insert(source.to_owned());
        Ok(())
    }

    fn read_text(&self) -> Result<Option<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LooperError::io(
                format!("read ledger {}", self.path.display()),
                e,
            )),
        }
    }
}

/// Set of recorded paths, rebuilt from the ledger file at startup.
/// Same exact-match semantics as [`ArrivalLedger::contains`].
#[derive(Debug, Default, Clone)]
pub struct LedgerIndex {
    seen: HashSet<String>,
}

impl LedgerIndex {
    pub fn contains(&self, source: &str) -> bool {
        self.seen.contains(source)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Ledger as seen by the scan cycle: the file, plus an optional in-memory
/// index that answers `contains` without rereading it.
#[derive(Debug, Clone)]
pub struct Ledger {
    file: ArrivalLedger,
    index: Option<LedgerIndex>,
}

impl Ledger {
    /// Every lookup rereads the ledger file.
    pub fn scanning(file: ArrivalLedger) -> Self {
        Self { file, index: None }
    }

    /// Lookups go to an index built from the file now.
    pub fn indexed(file: ArrivalLedger, reporter: &dyn Reporter) -> Result<Self> {
        let index = file.load_index(reporter)?;
        Ok(Self {
            file,
            index: Some(index),
        })
    }

    pub fn file(&self) -> &ArrivalLedger {
        &self.file
    }

    pub fn contains(&self, source: &str, reporter: &dyn Reporter) -> Result<bool> {
        match &self.index {
            Some(index) => Ok(index.contains(source)),
            None => self.file.contains(source, reporter),
        }
    }

    pub fn record(&mut self, source: &str) -> Result<()> {
        match &mut self.index {
            Some(index) => self.file.append_indexed(index, source),
            None => self.file.append(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MemoryReporter, NullReporter};

    #[test]
    fn missing_ledger_is_empty_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ArrivalLedger::new(dir.path().join("copied.txt"));
        let reporter = MemoryReporter::new();
        assert!(!ledger.contains("/in/a.bin", &reporter).unwrap());
        assert!(matches!(
            reporter.events().as_slice(),
            [CycleEvent::LedgerMissing { .. }]
        ));
        assert!(ledger.records().unwrap().is_empty());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn append_creates_file_and_contains_matches_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ArrivalLedger::new(dir.path().join("copied.txt"));
        ledger.append("/in/a.bin").unwrap();
        ledger.append("/in/b.bin").unwrap();

        assert!(ledger.contains("/in/a.bin", &NullReporter).unwrap());
        assert!(ledger.contains("/in/b.bin", &NullReporter).unwrap());
        // No substring or prefix matches.
        assert!(!ledger.contains("/in/a.bi", &NullReporter).unwrap());
        assert!(!ledger.contains("a.bin", &NullReporter).unwrap());
        assert!(!ledger.contains("/in/a.bin.part", &NullReporter).unwrap());
        assert!(!ledger.contains("/in//a.bin", &NullReporter).unwrap());

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(text, "/in/a.bin\n/in/b.bin\n");
    }

    #[test]
    fn records_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copied.txt");
        ArrivalLedger::new(&path).append("/in/x").unwrap();

        let reopened = ArrivalLedger::new(&path);
        assert!(reopened.contains("/in/x", &NullReporter).unwrap());
        assert_eq!(reopened.records().unwrap(), vec!["/in/x".to_string()]);
    }

    #[test]
    fn append_never_rewrites_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copied.txt");
        std::fs::write(&path, "/in/old\r\n").unwrap();
        let ledger = ArrivalLedger::new(&path);
        ledger.append("/in/new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/in/old\r\n/in/new\n");
        assert!(ledger.contains("/in/old", &NullReporter).unwrap());
    }

    #[test]
    fn records_with_line_breaks_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copied.txt");
        let ledger = ArrivalLedger::new(&path);
        for bad in ["/in/evil\n", "/in/a\nb", "/in/cr\r"] {
            let err = ledger.append(bad).unwrap_err();
            assert!(matches!(err, LooperError::Unrecordable { .. }), "{bad:?}");
        }
        assert!(!path.exists());

        let mut index = ledger.load_index(&NullReporter).unwrap();
        assert!(ledger.append_indexed(&mut index, "/in/evil\n").is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn index_mirrors_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ArrivalLedger::new(dir.path().join("copied.txt"));
        let mut index = ledger.load_index(&NullReporter).unwrap();
        assert!(index.is_empty());

        ledger.append_indexed(&mut index, "/in/a").unwrap();
        assert!(index.contains("/in/a"));
        assert!(!index.contains("/in/"));

        let rebuilt = ledger.load_index(&NullReporter).unwrap();
        assert_eq!(rebuilt.len(), 1);
        assert!(rebuilt.contains("/in/a"));
    }

    #[test]
    fn indexed_ledger_does_not_see_external_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = ArrivalLedger::new(dir.path().join("copied.txt"));
        file.append("/in/a").unwrap();

        let mut ledger = Ledger::indexed(file.clone(), &NullReporter).unwrap();
        // Written behind the index's back: only the scanning view picks it up.
        file.append("/in/b").unwrap();
        assert!(ledger.contains("/in/a", &NullReporter).unwrap());
        assert!(!ledger.contains("/in/b", &NullReporter).unwrap());
        assert!(Ledger::scanning(file.clone())
            .contains("/in/b", &NullReporter)
            .unwrap());

        ledger.record("/in/c").unwrap();
        assert!(ledger.contains("/in/c", &NullReporter).unwrap());
        assert_eq!(file.records().unwrap(), vec!["/in/a", "/in/b", "/in/c"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_ledger_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the ledger file should be: not NotFound, so it must fail.
        let path = dir.path().join("copied.txt");
        std::fs::create_dir(&path).unwrap();
        let ledger = ArrivalLedger::new(&path);
        assert!(ledger.contains("/in/a", &NullReporter).is_err());
        assert!(ledger.append("/in/a").is_err());
    }
}
