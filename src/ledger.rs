use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::RecordKey;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger append failed for {path}: {source}")]
    Append {
        path: String,
        source: std::io::Error,
    },
}

/// Append-only set of already-delivered record identities.
///
/// `commit` must be durable before the caller treats the record as sent;
/// a key lost mid-append simply reappears as unsent on the next run.
pub trait DedupLedger {
    fn has(&self, key: &RecordKey) -> bool;
    fn commit(&mut self, key: &RecordKey) -> Result<(), LedgerError>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Newline-delimited flat file, one key per delivered record. Read fully at
/// open; each commit is one appended line flushed before returning.
pub struct FileLedger {
    path: PathBuf,
    keys: HashSet<RecordKey>,
}

impl FileLedger {
    /// A missing or unreadable file is "no prior history", never fatal.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let keys = match File::open(&path) {
            Ok(f) => BufReader::new(f)
                .lines()
                .map_while(Result::ok)
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .map(RecordKey)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ledger unreadable, starting empty");
                HashSet::new()
            }
        };
        debug!(path = %path.display(), keys = keys.len(), "Ledger loaded");
        Self { path, keys }
    }
}

impl DedupLedger for FileLedger {
    fn has(&self, key: &RecordKey) -> bool {
        self.keys.contains(key)
    }

    fn commit(&mut self, key: &RecordKey) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::Append {
                path: self.path.display().to_string(),
                source: e,
            })?;
        writeln!(file, "{}", key).map_err(|e| LedgerError::Append {
            path: self.path.display().to_string(),
            source: e,
        })?;
        file.flush().map_err(|e| LedgerError::Append {
            path: self.path.display().to_string(),
            source: e,
        })?;
        self.keys.insert(key.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// In-memory ledger for tests and dry runs.
#[derive(Default)]
pub struct MemoryLedger {
    keys: HashSet<RecordKey>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupLedger for MemoryLedger {
    fn has(&self, key: &RecordKey) -> bool {
        self.keys.contains(key)
    }

    fn commit(&mut self, key: &RecordKey) -> Result<(), LedgerError> {
        self.keys.insert(key.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}
