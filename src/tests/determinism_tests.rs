// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::event::CaptureEvent;
use crate::manifest::Manifest;
use crate::proof::PackInfo;
use crate::timeline::Timeline;
use crate::types::digest::Digest;
use crate::types::timestamp::Timestamp;
use crate::verify::Verification;

/// A simple deterministic RNG for tests.
struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    fn new(seed: u64) -> Self {
        Self { state: seed, inc: 1 }
    }

    fn next_u32(&mut self) -> u32 {
        let oldstate = self.state;
        self.state = oldstate.wrapping_mul(6364136223846793005).wrapping_add(self.inc);
        let xorshifted = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

/// Replays a seeded capture session and returns the persisted timeline.
fn run_session(seed: u64, steps: usize) -> Vec<CaptureEvent> {
    let mut rng = Pcg32::new(seed);
    let tl = Timeline::new();
    let mut clock = 1_704_067_200i64;
    for _ in 0..steps {
        clock += (rng.next_u32() % 3600) as i64;
        let subject = match rng.next_u32() % 3 {
            0 => format!("https://example.com/{}", rng.next_u32() % 50),
            1 => format!("slack:#channel-{}", rng.next_u32() % 5),
            _ => format!("email:thread-{}", rng.next_u32()),
        };
        let payload = Digest::of(&rng.next_u32().to_be_bytes());
        tl.append(subject, payload, Timestamp::from_unix_secs(clock).unwrap())
            .unwrap();
    }
    tl.snapshot()
}

#[test]
fn test_same_inputs_same_chain() {
    let a = run_session(42, 200);
    let b = run_session(42, 200);
    assert_eq!(a, b);
    assert_eq!(a.last().unwrap().this_hash(), b.last().unwrap().this_hash());
}

#[test]
fn test_different_inputs_different_head() {
    let a = run_session(1, 50);
    let b = run_session(2, 50);
    assert_ne!(a.last().unwrap().this_hash(), b.last().unwrap().this_hash());
}

#[test]
fn test_timeline_json_bytes_stable() {
    let a = serde_json::to_vec_pretty(&run_session(7, 25)).unwrap();
    let b = serde_json::to_vec_pretty(&run_session(7, 25)).unwrap();
    assert_eq!(a, b);

    let back: Vec<CaptureEvent> = serde_json::from_slice(&a).unwrap();
    assert_eq!(serde_json::to_vec_pretty(&back).unwrap(), a);
}

#[test]
fn test_manifest_independent_of_insertion_order() {
    let files: Vec<(String, Digest)> = (0..20)
        .map(|i| (format!("evidence/doc-{i:02}.pdf"), Digest::of(&[i as u8])))
        .collect();

    let mut forward = Manifest::new();
    for (p, d) in &files {
        forward.insert(p.clone(), *d).unwrap();
    }
    let mut backward = Manifest::new();
    for (p, d) in files.iter().rev() {
        backward.insert(p.clone(), *d).unwrap();
    }

    assert_eq!(
        serde_json::to_vec_pretty(&forward).unwrap(),
        serde_json::to_vec_pretty(&backward).unwrap()
    );
}

#[test]
fn test_pack_info_reproducible() {
    let a = serde_json::to_vec(&PackInfo::for_events("case-9", &run_session(9, 10))).unwrap();
    let b = serde_json::to_vec(&PackInfo::for_events("case-9", &run_session(9, 10))).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_verification_is_idempotent() {
    let events = run_session(3, 30);
    let mut manifest = Manifest::new();
    manifest.insert("timeline.json", Digest::of(b"t")).unwrap();

    let run = || {
        let mut v = Verification::new();
        v.check_files(&manifest, &manifest).unwrap();
        v.check_chain(&events).unwrap();
        v.finish().unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.passed());
    assert_eq!(first, second);
    assert_eq!(first.lines(), second.lines());
    assert_eq!(first.events_verified(), 30);
}
