// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain Verification
//!
//! Pure re-walk of a persisted event sequence. No dependency on a live
//! [`Timeline`](crate::timeline::Timeline); the offline verifier runs exactly
//! this code.
//!
//! At each position `i` (0-based) three checks run in this order:
//! 1. recomputed `this_hash` equals the stored one
//! 2. `prev_hash` equals the previous event's `this_hash` (genesis at `i == 0`)
//! 3. `sequence == i`
//!
//! The first failing position is reported. Events after it are untrusted and
//! not checked.

use crate::config::GENESIS_HASH;
use crate::event::CaptureEvent;
use crate::types::digest::Digest;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// Stored `this_hash` does not match the recomputed one.
    HashMismatch,
    /// `prev_hash` does not commit to the preceding event (or genesis).
    PrevHashMismatch,
    /// Sequence gap, duplicate or reordering.
    SequenceMismatch { found: u64 },
    /// The event could not be canonically encoded.
    Unencodable,
}

impl fmt::Display for BreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakReason::HashMismatch => f.write_str("this_hash mismatch"),
            BreakReason::PrevHashMismatch => f.write_str("prev_hash mismatch"),
            BreakReason::SequenceMismatch { found } => write!(f, "sequence mismatch (found {found})"),
            BreakReason::Unencodable => f.write_str("event not encodable"),
        }
    }
}

/// First broken link. `sequence` is the position where the chain stopped
/// holding, which is also the sequence number the event there should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBreak {
    pub sequence: u64,
    pub reason: BreakReason,
}

/// Per-event result of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Valid { this_hash: Digest },
    Broken(BreakReason),
    /// After a break nothing downstream is trusted.
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainWalk {
    pub links: Vec<(u64, LinkStatus)>,
    pub broken: Option<ChainBreak>,
}

impl ChainWalk {
    pub fn is_intact(&self) -> bool {
        self.broken.is_none()
    }

    /// Hash of the last valid event, or genesis for an empty chain.
    pub fn head(&self) -> Digest {
        self.links
            .iter()
            .rev()
            .find_map(|(_, status)| match status {
                LinkStatus::Valid { this_hash } => Some(*this_hash),
                _ => None,
            })
            .unwrap_or(GENESIS_HASH)
    }
}

fn check_link(position: u64, event: &CaptureEvent, expected_prev: &Digest) -> Option<BreakReason> {
    match event.compute_hash() {
        Ok(h) if h == *event.this_hash() => {}
        Ok(_) => return Some(BreakReason::HashMismatch),
        Err(_) => return Some(BreakReason::Unencodable),
    }
    if event.prev_hash() != expected_prev {
        return Some(BreakReason::PrevHashMismatch);
    }
    if event.sequence() != position {
        return Some(BreakReason::SequenceMismatch { found: event.sequence() });
    }
    None
}

/// Walks the whole sequence, recording a status for every event.
pub fn walk_chain(events: &[CaptureEvent]) -> ChainWalk {
    let mut links = Vec::with_capacity(events.len());
    let mut broken = None;
    let mut expected_prev = GENESIS_HASH;

    for (i, event) in events.iter().enumerate() {
        let position = i as u64;
        if broken.is_some() {
            links.push((position, LinkStatus::Unchecked));
            continue;
        }
        match check_link(position, event, &expected_prev) {
            None => {
                expected_prev = *event.this_hash();
                links.push((position, LinkStatus::Valid { this_hash: expected_prev }));
            }
            Some(reason) => {
                tracing::warn!(sequence = position, %reason, "chain broken");
                broken = Some(ChainBreak { sequence: position, reason });
                links.push((position, LinkStatus::Broken(reason)));
            }
        }
    }

    ChainWalk { links, broken }
}

/// `Ok(())` if every link holds; otherwise the first break. An empty
/// sequence verifies trivially.
pub fn verify_chain(events: &[CaptureEvent]) -> Result<(), ChainBreak> {
    match walk_chain(events).broken {
        None => Ok(()),
        Some(b) => Err(b),
    }
}
