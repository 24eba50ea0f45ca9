//! Append-only audit journal with checksums
//!
//! Every request commits its [`AuditEvent`] batch as one transaction: all
//! entries are appended, then the file is flushed and fsynced exactly once.
//!
//! On disk each entry is a bincode-serialized body behind a fixed 8-byte
//! header, so torn or corrupted tails are detected on read-back:
//!
//! ```text
//! [body_len: u32][checksum: u32]   // CRC32C over the body bytes
//! [body: bincode(JournalEntry)]
//! ```

use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::records::AuditEvent;

/// Fixed frame header: body length + CRC32C
const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on a single entry body; larger lengths are corruption
const MAX_ENTRY_BODY: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("checksum mismatch in journal entry")]
    ChecksumMismatch,

    #[error("corrupt journal: {0}")]
    Corrupt(String),
}

/// A single journal entry representing one persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Global monotonic sequence number
    pub sequence: u64,
    /// Unix nanosecond timestamp of the request
    pub timestamp: i64,
    /// Event type tag (see [`AuditEvent::kind`])
    pub kind: String,
    /// Bincode-serialized event payload
    pub payload: Vec<u8>,
}

impl JournalEntry {
    pub fn new(sequence: u64, timestamp: i64, kind: String, payload: Vec<u8>) -> Self {
        Self {
            sequence,
            timestamp,
            kind,
            payload,
        }
    }

    /// Build an entry from an audit event
    pub fn from_event(
        sequence: u64,
        timestamp: i64,
        event: &AuditEvent,
    ) -> Result<Self, JournalError> {
        let payload =
            bincode::serialize(event).map_err(|e| JournalError::Serialization(e.to_string()))?;
        Ok(Self::new(sequence, timestamp, event.kind().to_string(), payload))
    }

    /// Decode the payload back into an audit event
    pub fn decode(&self) -> Result<AuditEvent, JournalError> {
        bincode::deserialize(&self.payload)
            .map_err(|e| JournalError::Serialization(e.to_string()))
    }

    /// Serialize to the framed on-disk representation
    pub fn encode_framed(&self) -> Result<Vec<u8>, JournalError> {
        let body =
            bincode::serialize(self).map_err(|e| JournalError::Serialization(e.to_string()))?;

        let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc32c(&body).to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize one framed entry from the front of `data`
    ///
    /// Returns `(entry, bytes_consumed)` on success. The checksum is
    /// verified before the body is decoded; corrupted framing is an error,
    /// never a panic.
    pub fn decode_framed(data: &[u8]) -> Result<(Self, usize), JournalError> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(JournalError::Corrupt("truncated entry header".into()));
        }

        let body_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if body_len == 0 || body_len > MAX_ENTRY_BODY {
            return Err(JournalError::Corrupt(format!(
                "implausible body length {body_len}"
            )));
        }

        let total = FRAME_HEADER_LEN + body_len;
        if data.len() < total {
            return Err(JournalError::Corrupt(format!(
                "incomplete entry: need {total} bytes, have {}",
                data.len()
            )));
        }

        let stored_checksum = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let body = &data[FRAME_HEADER_LEN..total];
        if crc32c(body) != stored_checksum {
            return Err(JournalError::ChecksumMismatch);
        }

        let entry: Self =
            bincode::deserialize(body).map_err(|e| JournalError::Serialization(e.to_string()))?;
        Ok((entry, total))
    }
}

/// Journal writer configuration
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory for journal files
    pub dir: PathBuf,
    /// Maximum file size in bytes before rotation
    pub max_file_size: u64,
}

impl JournalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: 64 * 1024 * 1024,
        }
    }
}

/// Append-only journal writer with one flush+fsync per committed batch
pub struct Journal {
    config: JournalConfig,
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_file_size: u64,
    next_sequence: u64,
    file_index: u64,
}

impl Journal {
    /// Open the journal, creating the directory if needed
    ///
    /// Scans existing files to resume the sequence counter after the last
    /// committed entry.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;

        let file_index = Self::find_latest_index(&config.dir);
        let current_file = Self::journal_path(&config.dir, file_index);

        let next_sequence = crate::reader::JournalReader::new(&config.dir)
            .read_all()?
            .last()
            .map(|entry| entry.sequence + 1)
            .unwrap_or(1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&current_file)?;
        let current_file_size = file.metadata()?.len();

        Ok(Self {
            config,
            writer: BufWriter::new(file),
            current_file,
            current_file_size,
            next_sequence,
            file_index,
        })
    }

    /// Next sequence number to be assigned
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Current file path
    pub fn current_file_path(&self) -> &Path {
        &self.current_file
    }

    /// Commit a request's event batch as a single transaction
    ///
    /// Appends one entry per event, then flushes and fsyncs once. Returns
    /// the sequence of the first entry written. An empty batch is a no-op.
    pub fn commit(&mut self, timestamp: i64, events: &[AuditEvent]) -> Result<u64, JournalError> {
        let first_sequence = self.next_sequence;
        if events.is_empty() {
            return Ok(first_sequence);
        }

        if self.current_file_size >= self.config.max_file_size {
            self.rotate()?;
        }

        for event in events {
            let entry = JournalEntry::from_event(self.next_sequence, timestamp, event)?;
            let bytes = entry.encode_framed()?;
            self.writer.write_all(&bytes)?;
            self.current_file_size += bytes.len() as u64;
            self.next_sequence += 1;
        }

        self.sync()?;
        Ok(first_sequence)
    }

    /// Force flush + fsync
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.sync()?;

        self.file_index += 1;
        self.current_file = Self::journal_path(&self.config.dir, self.file_index);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.current_file)?;
        self.writer = BufWriter::new(file);
        self.current_file_size = 0;
        Ok(())
    }

    pub(crate) fn journal_path(dir: &Path, index: u64) -> PathBuf {
        dir.join(format!("journal-{:06}.bin", index))
    }

    pub(crate) fn find_latest_index(dir: &Path) -> u64 {
        Self::file_indices(dir).into_iter().max().unwrap_or(0)
    }

    pub(crate) fn file_indices(dir: &Path) -> Vec<u64> {
        let mut indices: Vec<u64> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| {
                        let name = e.file_name().to_string_lossy().to_string();
                        name.strip_prefix("journal-")?
                            .strip_suffix(".bin")?
                            .parse::<u64>()
                            .ok()
                    })
                    .collect()
            })
            .unwrap_or_default();
        indices.sort_unstable();
        indices
    }
}
