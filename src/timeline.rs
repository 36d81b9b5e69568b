// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Hash-Chain Timeline
//!
//! Append-only, in-memory sequence of [`CaptureEvent`]s owned by the single
//! producing process.
//!
//! # Semantics
//! - `append` is the only mutation; there is no remove or update
//! - read head, seal next event, commit as new head happen under one lock,
//!   so concurrent producers sharing an `Arc<Timeline>` cannot interleave
//! - `append` never performs I/O; payload hashing is the caller's job
//! - `snapshot` is a read-only copy for persistence

use crate::chain::verify_chain;
use crate::config::GENESIS_HASH;
use crate::error::{KernelError, Result};
use crate::event::CaptureEvent;
use crate::types::digest::Digest;
use crate::types::timestamp::Timestamp;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct Timeline {
    events: Mutex<Vec<CaptureEvent>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted history (recovery). The history must verify.
    pub fn from_events(events: Vec<CaptureEvent>) -> Result<Self> {
        verify_chain(&events).map_err(KernelError::ChainBroken)?;
        Ok(Self {
            events: Mutex::new(events),
        })
    }

    /// Seals and commits the next event.
    pub fn append(
        &self,
        subject: impl Into<String>,
        payload_hash: Digest,
        timestamp: Timestamp,
    ) -> Result<CaptureEvent> {
        self.append_with(subject, payload_hash, timestamp, |_| Ok::<(), KernelError>(()))
    }

    /// Like [`append`](Self::append), but hands the sealed event to `persist`
    /// while the lock is held. The event becomes the new head only if
    /// `persist` succeeds, so a durable log never falls behind memory.
    pub fn append_with<E, F>(
        &self,
        subject: impl Into<String>,
        payload_hash: Digest,
        timestamp: Timestamp,
        persist: F,
    ) -> core::result::Result<CaptureEvent, E>
    where
        E: From<KernelError>,
        F: FnOnce(&CaptureEvent) -> core::result::Result<(), E>,
    {
        let mut events = self.lock();

        let sequence = events.len() as u64;
        let prev_hash = events.last().map(|e| *e.this_hash()).unwrap_or(GENESIS_HASH);
        let event = CaptureEvent::seal(sequence, timestamp, subject.into(), payload_hash, prev_hash)?;

        persist(&event)?;

        tracing::debug!(sequence, this_hash = %event.this_hash(), "appended capture event");
        events.push(event.clone());
        Ok(event)
    }

    /// Full ordered history.
    pub fn snapshot(&self) -> Vec<CaptureEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// `this_hash` of the newest event, or genesis.
    pub fn head_hash(&self) -> Digest {
        self.lock().last().map(|e| *e.this_hash()).unwrap_or(GENESIS_HASH)
    }

    // A panic while holding the lock cannot leave a half-written event: the
    // push is the last step, so the vector is consistent either way.
    fn lock(&self) -> MutexGuard<'_, Vec<CaptureEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn test_first_event_links_to_genesis() {
        let tl = Timeline::new();
        let e = tl.append("https://example.com/a", Digest::of(b"a"), ts(100)).unwrap();
        assert_eq!(e.sequence(), 0);
        assert_eq!(*e.prev_hash(), GENESIS_HASH);
        assert_eq!(tl.head_hash(), *e.this_hash());
    }

    #[test]
    fn test_sequences_are_contiguous_and_linked() {
        let tl = Timeline::new();
        for i in 0..10 {
            tl.append(format!("subject-{i}"), Digest::of(&[i as u8]), ts(100 + i)).unwrap();
        }
        let snap = tl.snapshot();
        assert_eq!(snap.len(), 10);
        for (i, e) in snap.iter().enumerate() {
            assert_eq!(e.sequence(), i as u64);
            if i > 0 {
                assert_eq!(e.prev_hash(), snap[i - 1].this_hash());
            }
        }
    }

    #[test]
    fn test_snapshot_does_not_affect_state() {
        let tl = Timeline::new();
        tl.append("s", Digest::of(b"x"), ts(1)).unwrap();
        let before = tl.snapshot();
        let _ = tl.snapshot();
        assert_eq!(tl.snapshot(), before);
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn test_empty_head_is_genesis() {
        let tl = Timeline::new();
        assert!(tl.is_empty());
        assert_eq!(tl.head_hash(), GENESIS_HASH);
    }

    #[test]
    fn test_restore_continues_chain() {
        let tl = Timeline::new();
        tl.append("a", Digest::of(b"a"), ts(1)).unwrap();
        tl.append("b", Digest::of(b"b"), ts(2)).unwrap();

        let restored = Timeline::from_events(tl.snapshot()).unwrap();
        let c = restored.append("c", Digest::of(b"c"), ts(3)).unwrap();
        assert_eq!(c.sequence(), 2);
        assert_eq!(*c.prev_hash(), tl.head_hash());
    }

    #[test]
    fn test_failed_persist_does_not_advance_head() {
        let tl = Timeline::new();
        tl.append("a", Digest::of(b"a"), ts(1)).unwrap();
        let head = tl.head_hash();

        let err = tl
            .append_with("b", Digest::of(b"b"), ts(2), |_| {
                Err(KernelError::Structural("disk full".into()))
            })
            .unwrap_err();
        assert!(matches!(err, KernelError::Structural(_)));
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.head_hash(), head);

        let b = tl.append("b", Digest::of(b"b"), ts(2)).unwrap();
        assert_eq!(b.sequence(), 1);
    }

    #[test]
    fn test_restore_rejects_broken_history() {
        let tl = Timeline::new();
        tl.append("a", Digest::of(b"a"), ts(1)).unwrap();
        tl.append("b", Digest::of(b"b"), ts(2)).unwrap();
        let mut events = tl.snapshot();
        events.swap(0, 1);

        let err = Timeline::from_events(events).unwrap_err();
        assert!(matches!(err, KernelError::ChainBroken(b) if b.sequence == 0));
    }
}
