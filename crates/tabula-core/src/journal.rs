//! Append-only mutation journal.
//!
//! Every successful insert, update or delete made through a
//! [`crate::Store`] with a journal configured appends one JSON line:
//!
//! ```text
//! {"timestamp":"2024-05-01T08:30:00Z","table":"user","operation":"update","keys":{"userid":"u1"}}
//! ```
//!
//! The file's modification time doubles as the invalidation signal for the
//! [`crate::cache::ReadCache`].

use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TabulaError},
    value::Row,
};

/// Kind of mutation recorded in the journal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// One journal line.
///
/// `keys` holds the primary key of inserted rows when known, otherwise the
/// inserted values; for updates and deletes it holds the filter. Temporal
/// values are written as ISO strings and read back as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: Timestamp,
    pub table: String,
    pub operation: Operation,
    pub keys: Row,
}

/// JSON-lines mutation log at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry stamped with the current time.
    pub fn record(&self, table: &str, operation: Operation, keys: Row) -> Result<()> {
        self.append(&JournalEntry {
            timestamp: Timestamp::now(),
            table: table.to_string(),
            operation,
            keys,
        })
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.fs_error(e))?;
        writeln!(file, "{line}").map_err(|e| self.fs_error(e))
    }

    /// Reads every entry; a missing file is an empty journal.
    pub fn entries(&self) -> Result<Vec<JournalEntry>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.fs_error(e)),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| self.fs_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Modification time of the journal file, `None` if it does not exist.
    pub fn modified(&self) -> Result<Option<SystemTime>> {
        match fs::metadata(&self.path) {
            Ok(meta) => meta.modified().map(Some).map_err(|e| self.fs_error(e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.fs_error(e)),
        }
    }

    fn fs_error(&self, source: std::io::Error) -> TabulaError {
        TabulaError::FileSystem {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{row, value::Value};

    #[test]
    fn test_record_and_read_back() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let journal = Journal::new(dir.path().join("mutations.log"));

        assert!(journal.entries().unwrap().is_empty());
        assert_eq!(journal.modified().unwrap(), None);

        journal
            .record("user", Operation::Insert, row! { "id" => 1 })
            .unwrap();
        journal
            .record("user", Operation::Delete, row! { "userid" => "u1", "active" => false })
            .unwrap();

        let entries = journal.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, Operation::Insert);
        assert_eq!(entries[0].keys["id"], Value::Integer(1));
        assert_eq!(entries[1].table, "user");
        assert_eq!(entries[1].keys["active"], Value::Boolean(false));
        assert!(journal.modified().unwrap().is_some());
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mutations.log");
        fs::write(&path, "{not json}\n").unwrap();

        let err = Journal::new(&path).entries().unwrap_err();
        assert!(matches!(err, TabulaError::Serialization { .. }));
    }
}
