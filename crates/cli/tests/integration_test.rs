use proofpack_cli::commands::build::{self, BuildOptions};
use proofpack_cli::commands::capture::{self, Payload};
use proofpack_cli::commands::timeline::{self, TimelineSource};
use proofpack_cli::commands::{extract, inspect, verify};
use proofpack_kernel::Digest;
use proofpack_persistence::fixtures;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_integration_workflow() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path()).unwrap();

    // Inspect a freshly built pack
    assert!(inspect::run(&paths.pack).is_ok());

    // Verify both the directory and the container
    assert!(verify::run(&paths.pack).is_ok(), "fresh pack should verify");
    assert!(verify::run(&paths.archive).is_ok(), "fresh container should verify");

    // Timeline from the journal and from the pack
    assert!(timeline::run(&TimelineSource::Journal(paths.journal.clone())).is_ok());
    assert!(timeline::run(&TimelineSource::Pack(paths.pack.clone())).is_ok());
}

#[test]
fn test_capture_then_build() {
    let dir = tempdir().unwrap();
    let journal = dir.path().join("events.journal");
    let page = dir.path().join("page.html");
    fs::write(&page, b"<html>hello</html>").unwrap();

    let e0 = capture::append(
        &journal,
        "HTTPS://Example.com/about/#team",
        &Payload::File(page.clone()),
        Some("2024-05-01T09:30:00.750+02:00"),
    )
    .unwrap();
    assert_eq!(e0.subject(), "https://example.com/about");
    assert_eq!(e0.timestamp().to_string(), "2024-05-01T07:30:00Z");
    assert_eq!(*e0.payload_hash(), Digest::of(b"<html>hello</html>"));

    let e1 = capture::append(
        &journal,
        "slack:#trading-desk",
        &Payload::Hash(Digest::of(b"export").to_hex()),
        Some("2024-05-01T08:00:00Z"),
    )
    .unwrap();
    assert_eq!(e1.prev_hash(), e0.this_hash());

    let evidence = dir.path().join("evidence");
    fs::create_dir_all(&evidence).unwrap();
    fs::copy(&page, evidence.join("about.html")).unwrap();
    let bin = dir.path().join("proofpack-verify");
    fs::write(&bin, fixtures::STAND_IN_VERIFIER).unwrap();

    let opts = BuildOptions {
        journal: journal.clone(),
        out: dir.path().join("pack"),
        pack_id: "example".into(),
        evidence: Some(evidence),
        verifier: Some(bin),
        without_verifier: false,
        archive: Some(dir.path().join("pack.tar.gz")),
    };
    let built = build::build(&opts).unwrap();
    assert_eq!(built.info.event_count, 2);
    assert!(built.manifest.contains("evidence/about.html"));
    assert!(built.manifest.contains("bin/proofpack-verify"));
    assert!(verify::run(&opts.out).is_ok());
    assert!(verify::run(opts.archive.as_ref().unwrap()).is_ok());
}

#[test]
fn test_bad_payload_hash_rejected() {
    let dir = tempdir().unwrap();
    let journal = dir.path().join("events.journal");
    let upper = Digest::of(b"x").to_hex().to_uppercase();
    assert!(capture::append(&journal, "s", &Payload::Hash(upper), None).is_err());
    assert!(capture::append(&journal, "s", &Payload::Hash("abc".into()), None).is_err());
}

#[test]
fn test_verify_reports_tamper_as_error() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path()).unwrap();

    let timeline_path = paths.pack.join("timeline.json");
    let text = fs::read_to_string(&timeline_path).unwrap();
    fs::write(&timeline_path, text.replacen("pricing", "pricing-v2", 1)).unwrap();

    let err = verify::run(&paths.pack).unwrap_err();
    assert!(err.to_string().contains("verification failed"));

    // The timeline listing still renders and flags the break.
    assert!(timeline::run(&TimelineSource::Pack(paths.pack.clone())).is_ok());
}

#[test]
fn test_build_with_bundled_verifier() {
    let dir = tempdir().unwrap();
    let (journal, _) = fixtures::generate_journal(dir.path()).unwrap();
    let fake_verifier = dir.path().join("proofpack-verify");
    fs::write(&fake_verifier, b"#!/bin/sh\nexit 0\n").unwrap();

    let opts = BuildOptions {
        journal,
        out: dir.path().join("pack"),
        pack_id: "bundled".into(),
        evidence: None,
        verifier: Some(fake_verifier),
        without_verifier: false,
        archive: None,
    };
    let built = build::build(&opts).unwrap();
    assert!(built.manifest.contains("bin/proofpack-verify"));
    assert!(verify::run(&built.dir).is_ok());
    assert!(inspect::run(&built.dir).is_ok());
}

#[test]
fn test_build_refuses_missing_journal() {
    let dir = tempdir().unwrap();
    let opts = BuildOptions {
        journal: dir.path().join("nope.journal"),
        out: dir.path().join("pack"),
        pack_id: "x".into(),
        evidence: None,
        verifier: None,
        without_verifier: true,
        archive: None,
    };
    assert!(build::build(&opts).is_err());
    assert!(!opts.out.exists());
}

#[test]
fn test_build_requires_a_verifier_unless_opted_out() {
    let dir = tempdir().unwrap();
    let (journal, _) = fixtures::generate_journal(dir.path()).unwrap();
    let mut opts = BuildOptions {
        journal,
        out: dir.path().join("pack"),
        pack_id: "bare".into(),
        evidence: None,
        verifier: None,
        without_verifier: false,
        archive: None,
    };
    let err = build::build(&opts).unwrap_err();
    assert!(err.to_string().contains("--no-verifier"));
    assert!(!opts.out.exists());

    opts.verifier = Some(dir.path().join("not-there"));
    assert!(build::build(&opts).is_err());
    assert!(!opts.out.exists());

    opts.verifier = None;
    opts.without_verifier = true;
    let built = build::build(&opts).unwrap();
    assert!(!built.manifest.contains("bin/proofpack-verify"));
    assert!(verify::run(&built.dir).is_ok());
}

#[test]
fn test_extract_then_verify() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path()).unwrap();
    let dest = dir.path().join("unpacked");

    extract::run(&paths.archive, &dest).unwrap();
    assert!(dest.join("bin/proofpack-verify").exists());
    assert!(verify::run(&dest).is_ok());

    // A second extraction into the same place is refused.
    assert!(extract::run(&paths.archive, &dest).is_err());
}
