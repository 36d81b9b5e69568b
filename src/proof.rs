// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Pack descriptor (`pack.json`).

use crate::chain::walk_chain;
use crate::config::{FORMAT_VERSION, GENESIS_HASH, HASH_ALGO};
use crate::event::CaptureEvent;
use crate::types::digest::Digest;
use serde::{Deserialize, Serialize};

/// Summary of what a Proof Pack claims to contain.
///
/// Carries no wall-clock data, so two builds from the same events produce the
/// same bytes. The head hash is the value operators compare across runs and
/// across copies of a pack: two packs with the same `pack_id` and event count
/// but different heads are a fork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackInfo {
    /// Layout and encoding version.
    pub format_version: u32,

    /// Operator-chosen label (source id, inquiry id).
    pub pack_id: String,

    /// Always `sha256`.
    pub hash_algo: String,

    /// Number of events in `timeline.json`.
    pub event_count: u64,

    /// `prev_hash` of event 0.
    pub genesis: Digest,

    /// `this_hash` of the last event, or genesis for an empty timeline.
    pub head_hash: Digest,
}

impl PackInfo {
    pub fn for_events(pack_id: impl Into<String>, events: &[CaptureEvent]) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            pack_id: pack_id.into(),
            hash_algo: HASH_ALGO.to_string(),
            event_count: events.len() as u64,
            genesis: GENESIS_HASH,
            head_hash: events.last().map(|e| *e.this_hash()).unwrap_or(GENESIS_HASH),
        }
    }

    /// Lists every way this descriptor disagrees with the protocol or with
    /// the given (already chain-checked) events.
    pub fn discrepancies(&self, events: &[CaptureEvent]) -> Vec<String> {
        let mut out = Vec::new();
        if self.format_version != FORMAT_VERSION {
            out.push(format!("unsupported format_version {}", self.format_version));
        }
        if self.hash_algo != HASH_ALGO {
            out.push(format!("unsupported hash_algo {:?}", self.hash_algo));
        }
        if self.genesis != GENESIS_HASH {
            out.push("genesis is not the protocol genesis constant".to_string());
        }
        if self.event_count != events.len() as u64 {
            out.push(format!(
                "event_count {} but timeline holds {}",
                self.event_count,
                events.len()
            ));
        }
        let walk = walk_chain(events);
        if walk.is_intact() && walk.head() != self.head_hash {
            out.push("head_hash does not match the last event".to_string());
        }
        out
    }
}
