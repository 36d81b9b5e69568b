//! Capture journal: the durable form of a live timeline.
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Entry][Entry][Entry]...
//! ```
//!
//! Header: magic `PPJL`, version u32, reserved u64 (0).
//!
//! Entry: `[sequence u64][len u32][crc64 u64][event JSON]`, little-endian.
//! The checksum covers sequence, length and JSON bytes.
//!
//! Every entry is fsync'd before the event becomes the in-memory head.
//! Reopening replays the file and re-verifies the whole chain; any checksum
//! mismatch, torn tail or chain break refuses to open.

use crate::error::{PersistenceError, Result};
use byteorder::{ByteOrder, LittleEndian};
use crc64fast::Digest as Crc64;
use proofpack_kernel::config::{JOURNAL_MAGIC, JOURNAL_VERSION};
use proofpack_kernel::{CaptureEvent, Digest, Timeline, Timestamp};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub reserved: u64,
}

impl JournalHeader {
    pub const SIZE: usize = 4 + 4 + 8;

    pub fn new() -> Self {
        Self {
            magic: JOURNAL_MAGIC,
            version: JOURNAL_VERSION,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.version);
        LittleEndian::write_u64(&mut buf[8..16], self.reserved);
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(PersistenceError::Corrupted("journal header truncated".into()));
        }
        if buf[0..4] != JOURNAL_MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }
        let version = LittleEndian::read_u32(&buf[4..8]);
        if version != JOURNAL_VERSION {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        Ok(Self {
            magic: JOURNAL_MAGIC,
            version,
            reserved: LittleEndian::read_u64(&buf[8..16]),
        })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub sequence: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl EntryHeader {
    pub const SIZE: usize = 8 + 4 + 8;

    fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u64(&mut buf[0..8], self.sequence);
        LittleEndian::write_u32(&mut buf[8..12], self.payload_len);
        LittleEndian::write_u64(&mut buf[12..20], self.checksum);
        buf
    }

    fn parse(buf: &[u8]) -> Self {
        Self {
            sequence: LittleEndian::read_u64(&buf[0..8]),
            payload_len: LittleEndian::read_u32(&buf[8..12]),
            checksum: LittleEndian::read_u64(&buf[12..20]),
        }
    }
}

fn checksum(sequence: u64, payload: &[u8]) -> u64 {
    let mut digest = Crc64::new();
    digest.write(&sequence.to_le_bytes());
    digest.write(&(payload.len() as u32).to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

/// Decodes every entry after the header. Fails on the first defect.
fn decode_entries(body: &[u8]) -> Result<Vec<CaptureEvent>> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < body.len() {
        if body.len() - offset < EntryHeader::SIZE {
            return Err(PersistenceError::Corrupted(format!(
                "journal entry header truncated at byte {}",
                JournalHeader::SIZE + offset
            )));
        }
        let header = EntryHeader::parse(&body[offset..offset + EntryHeader::SIZE]);
        offset += EntryHeader::SIZE;

        let len = header.payload_len as usize;
        if body.len() - offset < len {
            return Err(PersistenceError::Corrupted(format!(
                "journal entry {} truncated",
                header.sequence
            )));
        }
        let payload = &body[offset..offset + len];
        offset += len;

        let found = checksum(header.sequence, payload);
        if found != header.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                sequence: header.sequence,
                expected: header.checksum,
                found,
            });
        }

        let event: CaptureEvent = serde_json::from_slice(payload)
            .map_err(|e| PersistenceError::json(format!("journal entry {}", header.sequence), e))?;
        if event.sequence() != header.sequence {
            return Err(PersistenceError::Corrupted(format!(
                "journal entry {} holds event {}",
                header.sequence,
                event.sequence()
            )));
        }
        events.push(event);
    }

    Ok(events)
}

/// Reads and verifies a journal without opening it for writing.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<CaptureEvent>> {
    let bytes = fs::read(path)?;
    JournalHeader::parse(&bytes)?;
    let events = decode_entries(&bytes[JournalHeader::SIZE..])?;
    proofpack_kernel::verify_chain(&events).map_err(proofpack_kernel::KernelError::ChainBroken)?;
    Ok(events)
}

/// Runs `write` for one encoded entry. On failure the file is cut back to its
/// length before the write, so a rejected append leaves no bytes behind.
fn commit_entry(
    file: &File,
    entry: &[u8],
    write: impl FnOnce(&File, &[u8]) -> io::Result<()>,
) -> Result<()> {
    let committed = file.metadata()?.len();
    if let Err(e) = write(file, entry) {
        tracing::warn!(error = %e, len = committed, "journal append failed, rolling back");
        file.set_len(committed)?;
        file.sync_data()?;
        return Err(e.into());
    }
    Ok(())
}

/// Append-only capture journal backing a [`Timeline`].
///
/// Shareable across threads; appends serialize on the timeline's lock.
#[derive(Debug)]
pub struct CaptureJournal {
    path: PathBuf,
    file: File,
    timeline: Timeline,
}

impl CaptureJournal {
    /// Opens or creates a journal.
    ///
    /// An existing file is replayed in full and must verify.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let exists = path.exists() && fs::metadata(&path)?.len() > 0;

        let timeline = if exists {
            let events = read_events(&path)?;
            tracing::debug!(path = %path.display(), events = events.len(), "replayed capture journal");
            Timeline::from_events(events)?
        } else {
            Timeline::new()
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if !exists {
            file.write_all(&JournalHeader::new().to_bytes())?;
            file.sync_all()?;
        }

        Ok(Self { path, file, timeline })
    }

    /// Appends one capture. Returns only after the entry is on disk.
    pub fn append(
        &self,
        subject: impl Into<String>,
        payload_hash: Digest,
        timestamp: Timestamp,
    ) -> Result<CaptureEvent> {
        self.timeline
            .append_with(subject, payload_hash, timestamp, |event| self.write_entry(event))
    }

    fn write_entry(&self, event: &CaptureEvent) -> Result<()> {
        let payload = serde_json::to_vec(event).map_err(|e| PersistenceError::json("journal entry", e))?;
        let header = EntryHeader {
            sequence: event.sequence(),
            payload_len: payload.len() as u32,
            checksum: checksum(event.sequence(), &payload),
        };

        let mut buf = Vec::with_capacity(EntryHeader::SIZE + payload.len());
        buf.extend_from_slice(&header.to_bytes());
        buf.extend_from_slice(&payload);

        commit_entry(&self.file, &buf, |mut file, bytes| {
            file.write_all(bytes)?;
            file.sync_data()
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn snapshot(&self) -> Vec<CaptureEvent> {
        self.timeline.snapshot()
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }
}
