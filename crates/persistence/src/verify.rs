//! Offline pack verification.
//!
//! Drives the kernel's [`Verification`] state machine over an extracted pack
//! directory or directly over a `.tar.gz` container. A missing or unparseable
//! `manifest.json` / `timeline.json` is a structural failure, reported in the
//! same report as any tamper, never as an error. `Err` is returned only when
//! the pack could not be opened at all.
//!
//! `pack.json` is optional; when present it must agree with the timeline.

use crate::error::{PersistenceError, Result};
use crate::hashing::build_manifest;
use crate::container::read_archive;
use proofpack_kernel::config::{MANIFEST_FILE, PACK_INFO_FILE, TIMELINE_FILE};
use proofpack_kernel::{CaptureEvent, Digest, Manifest, PackInfo, Verification, VerificationReport};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

/// What verification needs from a pack, however it is stored.
struct PackContents {
    /// Hashes of every file present except `manifest.json`.
    observed: std::result::Result<Manifest, String>,
    manifest: Option<Vec<u8>>,
    timeline: Option<Vec<u8>>,
    pack_info: Option<Vec<u8>>,
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, bytes: &[u8]) -> std::result::Result<T, String> {
    serde_json::from_slice(bytes).map_err(|e| format!("{name} malformed: {e}"))
}

fn run(contents: PackContents) -> Result<VerificationReport> {
    let mut v = Verification::new();

    match (&contents.manifest, &contents.observed) {
        (None, _) => v.skip_files(format!("{MANIFEST_FILE} missing"))?,
        (Some(bytes), observed) => match (parse::<Manifest>(MANIFEST_FILE, bytes), observed) {
            (Err(why), _) => v.skip_files(why)?,
            (Ok(_), Err(why)) => v.skip_files(why.clone())?,
            (Ok(expected), Ok(observed)) => v.check_files(&expected, observed)?,
        },
    }

    let events: Option<Vec<CaptureEvent>> = match &contents.timeline {
        None => {
            v.skip_chain(format!("{TIMELINE_FILE} missing"))?;
            None
        }
        Some(bytes) => match parse::<Vec<CaptureEvent>>(TIMELINE_FILE, bytes) {
            Err(why) => {
                v.skip_chain(why)?;
                None
            }
            Ok(events) => {
                v.check_chain(&events)?;
                Some(events)
            }
        },
    };

    if let Some(bytes) = &contents.pack_info {
        match parse::<PackInfo>(PACK_INFO_FILE, bytes) {
            Err(why) => v.structural(why),
            Ok(info) => {
                if let Some(events) = &events {
                    for problem in info.discrepancies(events) {
                        v.structural(format!("{PACK_INFO_FILE}: {problem}"));
                    }
                }
            }
        }
    }

    let report = v.finish()?;
    if report.passed() {
        tracing::info!(
            files = report.files_checked(),
            events = report.events_verified(),
            "proof pack PASS"
        );
    } else {
        tracing::warn!(failures = report.failures.len(), "proof pack FAIL");
    }
    Ok(report)
}

/// Verifies an extracted pack in place.
pub fn verify_pack_dir(dir: &Path) -> Result<VerificationReport> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a pack directory", dir.display()),
        )
        .into());
    }

    let observed = match build_manifest(dir, &[MANIFEST_FILE]) {
        Ok(m) => Ok(m),
        Err(e @ (PersistenceError::UnsafeEntry { .. } | PersistenceError::Kernel(_))) => Err(e.to_string()),
        Err(e) => return Err(e),
    };

    run(PackContents {
        observed,
        manifest: read_optional(&dir.join(MANIFEST_FILE))?,
        timeline: read_optional(&dir.join(TIMELINE_FILE))?,
        pack_info: read_optional(&dir.join(PACK_INFO_FILE))?,
    })
}

/// Report for a container that opened but could not be decoded. The pack is
/// unreadable as a whole, so neither check can run.
fn rejected_container(why: String) -> Result<VerificationReport> {
    let mut v = Verification::new();
    v.skip_files(why)?;
    v.skip_chain("container rejected before the chain was read")?;
    let report = v.finish()?;
    tracing::warn!(failures = report.failures.len(), "proof pack FAIL");
    Ok(report)
}

/// Verifies a `.tar.gz` container without extracting it to disk.
///
/// Only failing to open the file is an error. A stream that is truncated,
/// corrupt or holds unsafe entries is a structural failure of the pack.
pub fn verify_container(path: &Path) -> Result<VerificationReport> {
    let file = File::open(path)?;
    let mut files: BTreeMap<String, Vec<u8>> = match read_archive(BufReader::new(file)) {
        Ok(files) => files,
        Err(e) => return rejected_container(format!("container unreadable: {e}")),
    };

    let manifest = files.remove(MANIFEST_FILE);
    let timeline = files.get(TIMELINE_FILE).cloned();
    let pack_info = files.get(PACK_INFO_FILE).cloned();

    let mut observed = Manifest::new();
    let mut bad_path = None;
    for (rel, bytes) in &files {
        if let Err(e) = observed.insert(rel.clone(), Digest::of(bytes)) {
            bad_path = Some(e.to_string());
            break;
        }
    }

    run(PackContents {
        observed: match bad_path {
            Some(why) => Err(why),
            None => Ok(observed),
        },
        manifest,
        timeline,
        pack_info,
    })
}

/// Dispatches on the path: directories are verified in place, anything else
/// is treated as a container.
pub fn verify_path(path: &Path) -> Result<VerificationReport> {
    if path.is_dir() {
        verify_pack_dir(path)
    } else {
        verify_container(path)
    }
}
