// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::chain::verify_chain;
use crate::timeline::Timeline;
use crate::types::digest::Digest;
use crate::types::timestamp::Timestamp;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 250;

#[test]
fn test_concurrent_appends_stay_linked() {
    let tl = Arc::new(Timeline::new());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let tl = Arc::clone(&tl);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let subject = format!("producer-{p}/item-{i}");
                    let payload = Digest::of(subject.as_bytes());
                    tl.append(subject, payload, Timestamp::from_unix_secs(i as i64).unwrap())
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let events = tl.snapshot();
    assert_eq!(events.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(verify_chain(&events), Ok(()));

    let subjects: HashSet<&str> = events.iter().map(|e| e.subject()).collect();
    assert_eq!(subjects.len(), events.len(), "no append lost or duplicated");
}

#[test]
fn test_timeline_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Timeline>();
}

#[test]
fn test_snapshots_during_appends_verify() {
    let tl = Arc::new(Timeline::new());
    let writer = {
        let tl = Arc::clone(&tl);
        thread::spawn(move || {
            for i in 0..500 {
                tl.append(format!("s{i}"), Digest::of(&[0]), Timestamp::from_unix_secs(0).unwrap())
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let snap = tl.snapshot();
        assert_eq!(verify_chain(&snap), Ok(()));
    }
    writer.join().unwrap();
    assert_eq!(tl.len(), 500);
}
