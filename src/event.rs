// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Capture Event
//!
//! One immutable, hash-chained record of a captured fact. The core never sees
//! the captured material itself, only its `payload_hash`.
//!
//! # Invariants
//! - `this_hash = SHA256(canonical_encode(sequence, timestamp, subject, payload_hash, prev_hash))`
//! - `this_hash` is assigned once by [`CaptureEvent::seal`] and never recomputed in place
//! - events are only constructed by the timeline or by deserializing persisted data

use crate::encode::{CanonicalEncoder, Schema};
use crate::error::Result;
use crate::types::digest::Digest;
use crate::types::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Field order of the hashed portion of an event.
pub const EVENT_SCHEMA: Schema = Schema {
    name: "proofpack.capture_event.v1",
    fields: &["sequence", "timestamp", "subject", "payload_hash", "prev_hash"],
};

/// Persisted field order (`timeline.json`) follows declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureEvent {
    sequence: u64,
    timestamp: Timestamp,
    subject: String,
    payload_hash: Digest,
    prev_hash: Digest,
    this_hash: Digest,
}

impl CaptureEvent {
    /// Builds an event and assigns its chain hash.
    pub(crate) fn seal(
        sequence: u64,
        timestamp: Timestamp,
        subject: String,
        payload_hash: Digest,
        prev_hash: Digest,
    ) -> Result<Self> {
        let mut event = Self {
            sequence,
            timestamp,
            subject,
            payload_hash,
            prev_hash,
            this_hash: Digest::ZERO,
        };
        event.this_hash = event.compute_hash()?;
        Ok(event)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn payload_hash(&self) -> &Digest {
        &self.payload_hash
    }

    pub fn prev_hash(&self) -> &Digest {
        &self.prev_hash
    }

    pub fn this_hash(&self) -> &Digest {
        &self.this_hash
    }

    /// Canonical bytes of the hashed fields. `this_hash` is not part of them.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        CanonicalEncoder::new(&EVENT_SCHEMA)
            .u64("sequence", self.sequence)?
            .str("timestamp", &self.timestamp.to_canonical_string())?
            .str("subject", &self.subject)?
            .digest("payload_hash", &self.payload_hash)?
            .digest("prev_hash", &self.prev_hash)?
            .finish()
    }

    /// Recomputes the chain hash from the stored fields without touching them.
    pub fn compute_hash(&self) -> Result<Digest> {
        Ok(Digest::of(&self.canonical_bytes()?))
    }
}
