use crate::assemble::PackBuilder;
use crate::container::write_container;
use crate::error::Result;
use crate::journal::CaptureJournal;
use proofpack_kernel::{Digest, Timestamp};

use std::fs;
use std::path::{Path, PathBuf};

pub struct TestPaths {
    pub journal: PathBuf,
    pub evidence: PathBuf,
    pub pack: PathBuf,
    pub archive: PathBuf,
}

/// Captured pages used by every scenario: (subject, body).
pub const SAMPLE_CAPTURES: [(&str, &str); 3] = [
    ("https://example.com/", "<html><body>home</body></html>"),
    ("https://example.com/pricing", "<html><body>$10/month</body></html>"),
    ("https://example.com/terms", "<html><body>terms v2</body></html>"),
];

/// First capture time used by the scenarios (2024-03-01T12:00:00Z).
pub const SAMPLE_START: i64 = 1_709_294_400;

/// Writes a journal with [`SAMPLE_CAPTURES`], one minute apart, and the
/// captured bodies as evidence files.
pub fn generate_journal(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let journal_path = dir.join("events.journal");
    let evidence_dir = dir.join("captures");
    fs::create_dir_all(&evidence_dir)?;

    let journal = CaptureJournal::open(&journal_path)?;
    for (i, (subject, body)) in SAMPLE_CAPTURES.iter().enumerate() {
        fs::write(evidence_dir.join(format!("capture-{i}.html")), body)?;
        journal.append(
            *subject,
            Digest::of(body.as_bytes()),
            Timestamp::from_unix_secs(SAMPLE_START + 60 * i as i64)?,
        )?;
    }

    Ok((journal_path, evidence_dir))
}

/// Launcher bundled by [`generate_test_scenario`] when the caller has no
/// built verifier to hand.
pub const STAND_IN_VERIFIER: &str = "#!/bin/sh\nexec proofpack-verify \"$@\"\n";

/// Journal, evidence, built pack directory and container, with
/// [`STAND_IN_VERIFIER`] bundled at `bin/proofpack-verify`.
pub fn generate_test_scenario(dir: &Path) -> Result<TestPaths> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let verifier = dir.join("stand-in-verifier.sh");
    fs::write(&verifier, STAND_IN_VERIFIER)?;
    generate_test_scenario_with(dir, &verifier)
}

/// Same as [`generate_test_scenario`], bundling `verifier` instead.
pub fn generate_test_scenario_with(dir: &Path, verifier: &Path) -> Result<TestPaths> {
    let (journal_path, evidence_dir) = generate_journal(dir)?;

    let journal = CaptureJournal::open(&journal_path)?;
    let pack_dir = dir.join("pack");
    PackBuilder::new("example-com", journal.snapshot())
        .evidence_dir(&evidence_dir)?
        .verifier(verifier)
        .write_dir(&pack_dir)?;

    let archive = dir.join("pack.tar.gz");
    write_container(&pack_dir, &archive)?;

    Ok(TestPaths {
        journal: journal_path,
        evidence: evidence_dir,
        pack: pack_dir,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{verify_container, verify_pack_dir};
    use tempfile::tempdir;

    #[test]
    fn test_generate_scenario() {
        let dir = tempdir().unwrap();
        let paths = generate_test_scenario(dir.path()).unwrap();

        assert!(paths.journal.exists());
        assert!(paths.pack.join("manifest.json").exists());
        assert!(paths.pack.join("evidence/capture-2.html").exists());
        assert_eq!(
            fs::read_to_string(paths.pack.join("bin/proofpack-verify")).unwrap(),
            STAND_IN_VERIFIER
        );
        assert!(paths.archive.exists());

        assert!(verify_pack_dir(&paths.pack).unwrap().passed());
        let report = verify_container(&paths.archive).unwrap();
        assert!(report.passed());
        assert_eq!(report.files_checked(), 7);
    }

    #[test]
    fn test_scenarios_are_reproducible() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let pa = generate_test_scenario(a.path()).unwrap();
        let pb = generate_test_scenario(b.path()).unwrap();

        for name in ["manifest.json", "timeline.json", "pack.json"] {
            assert_eq!(fs::read(pa.pack.join(name)).unwrap(), fs::read(pb.pack.join(name)).unwrap());
        }
        assert_eq!(fs::read(pa.archive).unwrap(), fs::read(pb.archive).unwrap());
    }
}
