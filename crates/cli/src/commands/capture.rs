use anyhow::{Context, Result};
use chrono::Utc;
use proofpack_kernel::{CaptureEvent, Digest, Timestamp};
use proofpack_persistence::hashing::hash_file;
use proofpack_persistence::CaptureJournal;
use std::path::{Path, PathBuf};

use crate::subject::canonicalize_subject;

/// Where the payload hash comes from.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Hash this file's bytes.
    File(PathBuf),
    /// Already-computed lowercase hex SHA-256.
    Hash(String),
}

impl Payload {
    fn digest(&self) -> Result<Digest> {
        match self {
            Payload::File(path) => hash_file(path)
                .with_context(|| format!("Failed to hash payload {}", path.display())),
            Payload::Hash(hex) => Digest::from_hex(hex).context("Invalid --payload-hash"),
        }
    }
}

/// Appends one capture to the journal and returns the sealed event.
pub fn append(journal: &Path, subject: &str, payload: &Payload, at: Option<&str>) -> Result<CaptureEvent> {
    let payload_hash = payload.digest()?;
    let timestamp = match at {
        Some(text) => Timestamp::parse_rfc3339(text).context("Invalid --at timestamp")?,
        None => Timestamp::from_datetime(Utc::now()),
    };
    let subject = canonicalize_subject(subject);

    let journal = CaptureJournal::open(journal)
        .with_context(|| format!("Failed to open journal {}", journal.display()))?;
    let event = journal.append(subject, payload_hash, timestamp)?;

    tracing::info!(sequence = event.sequence(), subject = %event.subject(), "captured");
    Ok(event)
}

pub fn run(journal: &Path, subject: &str, payload: &Payload, at: Option<&str>) -> Result<()> {
    let event = append(journal, subject, payload, at)?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
