//! Journal read-back
//!
//! Sequential reader over all journal files in index order. Every entry's
//! framing and CRC32C checksum is verified; corruption surfaces as an error
//! rather than silently truncated history.

use std::fs;
use std::path::PathBuf;

use crate::journal::{Journal, JournalEntry, JournalError};
use crate::records::AuditEvent;

/// Verifying reader over a journal directory
pub struct JournalReader {
    dir: PathBuf,
}

impl JournalReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read every entry across all journal files, verifying checksums
    pub fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        if !self.dir.exists() {
            return Ok(entries);
        }

        for index in Journal::file_indices(&self.dir) {
            let path = Journal::journal_path(&self.dir, index);
            let data = fs::read(&path)?;

            let mut pos = 0;
            while pos < data.len() {
                let (entry, consumed) = JournalEntry::decode_framed(&data[pos..])?;
                entries.push(entry);
                pos += consumed;
            }
        }
        Ok(entries)
    }

    /// Read and decode every audit event in journal order
    pub fn read_events(&self) -> Result<Vec<AuditEvent>, JournalError> {
        self.read_all()?
            .iter()
            .map(|entry| entry.decode())
            .collect()
    }
}
