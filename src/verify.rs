// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Verification model.
//!
//! State machine and report shared by the offline verifier and the CLI:
//!
//! ```text
//! Pending -> CheckingFiles -> CheckingChain -> Passed | Failed
//! ```
//!
//! Every file and every event is reported individually. There is no partial
//! success: a single failure of any kind makes the verdict `Failed`. Nothing is
//! retried or repaired.

use crate::chain::{walk_chain, BreakReason, ChainBreak, LinkStatus};
use crate::error::{KernelError, Result};
use crate::event::CaptureEvent;
use crate::manifest::{FileCheck, FileStatus, Manifest};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    Pending,
    CheckingFiles,
    CheckingChain,
    Passed,
    Failed,
}

impl VerifyState {
    fn can_advance_to(self, next: VerifyState) -> bool {
        matches!(
            (self, next),
            (VerifyState::Pending, VerifyState::CheckingFiles)
                | (VerifyState::CheckingFiles, VerifyState::CheckingChain)
                | (VerifyState::CheckingChain, VerifyState::Passed)
                | (VerifyState::CheckingChain, VerifyState::Failed)
        )
    }
}

/// One reason a pack failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A file no longer matches its manifest entry, is missing, or is unlisted.
    Integrity { path: String, status: FileStatus },
    /// The hash chain is broken at a specific sequence.
    Chain(ChainBreak),
    /// `manifest.json`, `timeline.json` or `pack.json` is missing or malformed.
    Structural(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Integrity { path, status } => {
                let what = match status {
                    FileStatus::Ok => "ok",
                    FileStatus::Mismatch { .. } => "hash mismatch",
                    FileStatus::Missing => "missing",
                    FileStatus::Extra => "not in manifest",
                };
                write!(f, "integrity failure: {path} ({what})")
            }
            Failure::Chain(b) => write!(f, "chain failure: sequence {} ({})", b.sequence, b.reason),
            Failure::Structural(what) => write!(f, "structural failure: {what}"),
        }
    }
}

/// Per-event line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCheck {
    pub sequence: u64,
    pub status: LinkStatus,
}

#[derive(Debug)]
pub struct Verification {
    state: VerifyState,
    files: Vec<FileCheck>,
    events: Vec<EventCheck>,
    failures: Vec<Failure>,
}

impl Default for Verification {
    fn default() -> Self {
        Self::new()
    }
}

impl Verification {
    pub fn new() -> Self {
        Self {
            state: VerifyState::Pending,
            files: Vec::new(),
            events: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> VerifyState {
        self.state
    }

    fn advance(&mut self, next: VerifyState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(KernelError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = ?self.state, to = ?next, "verification state");
        self.state = next;
        Ok(())
    }

    /// Step 1: compares the manifest against hashes of the files present.
    pub fn check_files(&mut self, expected: &Manifest, observed: &Manifest) -> Result<()> {
        self.advance(VerifyState::CheckingFiles)?;
        for check in expected.compare(observed) {
            if !check.is_ok() {
                tracing::warn!(path = %check.path, status = ?check.status, "integrity failure");
                self.failures.push(Failure::Integrity {
                    path: check.path.clone(),
                    status: check.status.clone(),
                });
            }
            self.files.push(check);
        }
        Ok(())
    }

    /// Step 1 when no usable manifest exists.
    pub fn skip_files(&mut self, reason: impl Into<String>) -> Result<()> {
        self.advance(VerifyState::CheckingFiles)?;
        self.structural(reason);
        Ok(())
    }

    /// Step 2: re-walks the hash chain.
    pub fn check_chain(&mut self, events: &[CaptureEvent]) -> Result<()> {
        self.advance(VerifyState::CheckingChain)?;
        let walk = walk_chain(events);
        self.events = walk
            .links
            .into_iter()
            .map(|(sequence, status)| EventCheck { sequence, status })
            .collect();
        if let Some(b) = walk.broken {
            self.failures.push(Failure::Chain(b));
        }
        Ok(())
    }

    /// Step 2 when `timeline.json` could not be parsed.
    pub fn skip_chain(&mut self, reason: impl Into<String>) -> Result<()> {
        self.advance(VerifyState::CheckingChain)?;
        self.structural(reason);
        Ok(())
    }

    /// Records a structural defect found at any point before the verdict.
    pub fn structural(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%reason, "structural failure");
        self.failures.push(Failure::Structural(reason));
    }

    /// Final verdict.
    pub fn finish(mut self) -> Result<VerificationReport> {
        let verdict = if self.failures.is_empty() {
            VerifyState::Passed
        } else {
            VerifyState::Failed
        };
        self.advance(verdict)?;
        Ok(VerificationReport {
            state: self.state,
            files: self.files,
            events: self.events,
            failures: self.failures,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub state: VerifyState,
    pub files: Vec<FileCheck>,
    pub events: Vec<EventCheck>,
    pub failures: Vec<Failure>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.state == VerifyState::Passed
    }

    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    pub fn events_verified(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.status, LinkStatus::Valid { .. }))
            .count()
    }

    /// Paths whose integrity check failed.
    pub fn failing_paths(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter_map(|f| match f {
                Failure::Integrity { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Sequence of the chain break, if any.
    pub fn chain_break(&self) -> Option<ChainBreak> {
        self.failures.iter().find_map(|f| match f {
            Failure::Chain(b) => Some(*b),
            _ => None,
        })
    }

    /// One line per file, one per event, one per structural failure, then the
    /// summary. Identical reports render identically.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.files.len() + self.events.len() + 1);

        for f in &self.files {
            out.push(match &f.status {
                FileStatus::Ok => format!("OK        file  {}", f.path),
                FileStatus::Mismatch { expected, actual } => format!(
                    "MISMATCH  file  {} (expected {}, actual {})",
                    f.path, expected, actual
                ),
                FileStatus::Missing => format!("MISSING   file  {}", f.path),
                FileStatus::Extra => format!("EXTRA     file  {}", f.path),
            });
        }

        for e in &self.events {
            out.push(match &e.status {
                LinkStatus::Valid { this_hash } => format!("OK        event {} {}", e.sequence, this_hash),
                LinkStatus::Broken(reason) => format!("BROKEN    event {} ({})", e.sequence, reason),
                LinkStatus::Unchecked => format!("UNCHECKED event {} (after break)", e.sequence),
            });
        }

        for f in &self.failures {
            if let Failure::Structural(what) = f {
                out.push(format!("INVALID   {what}"));
            }
        }

        out.push(self.summary());
        out
    }

    pub fn summary(&self) -> String {
        if self.passed() {
            format!(
                "PASS: {} files verified, {} events verified",
                self.files_checked(),
                self.events_verified()
            )
        } else {
            let reasons: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
            format!("FAIL: {} failure(s): {}", self.failures.len(), reasons.join("; "))
        }
    }
}

/// Short category of a break, for tabular output.
pub struct BreakReasonLabel(pub BreakReason);

impl fmt::Display for BreakReasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.0 {
            BreakReason::HashMismatch => "hash",
            BreakReason::PrevHashMismatch => "linkage",
            BreakReason::SequenceMismatch { .. } => "sequence",
            BreakReason::Unencodable => "encoding",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Timeline;
    use crate::types::digest::Digest;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_transitions_enforced() {
        let mut v = Verification::new();
        assert!(v.check_chain(&[]).is_err(), "chain before files");
        v.check_files(&Manifest::new(), &Manifest::new()).unwrap();
        assert!(v.check_files(&Manifest::new(), &Manifest::new()).is_err());
        v.check_chain(&[]).unwrap();
        assert_eq!(v.state(), VerifyState::CheckingChain);
    }

    #[test]
    fn test_finish_before_chain_rejected() {
        let mut v = Verification::new();
        v.check_files(&Manifest::new(), &Manifest::new()).unwrap();
        assert!(matches!(v.finish(), Err(KernelError::InvalidTransition { .. })));
    }

    #[test]
    fn test_empty_pack_passes_with_zero_events() {
        let mut v = Verification::new();
        v.check_files(&Manifest::new(), &Manifest::new()).unwrap();
        v.check_chain(&[]).unwrap();
        let report = v.finish().unwrap();
        assert!(report.passed());
        assert_eq!(report.events_verified(), 0);
        assert_eq!(report.summary(), "PASS: 0 files verified, 0 events verified");
    }

    #[test]
    fn test_failures_enumerated_not_collapsed() {
        let tl = Timeline::new();
        tl.append("a", Digest::of(b"a"), Timestamp::from_unix_secs(1).unwrap()).unwrap();
        tl.append("b", Digest::of(b"b"), Timestamp::from_unix_secs(2).unwrap()).unwrap();
        let mut events = tl.snapshot();
        events.swap(0, 1);

        let mut expected = Manifest::new();
        expected.insert("timeline.json", Digest::of(b"t")).unwrap();
        expected.insert("evidence/x.pdf", Digest::of(b"x")).unwrap();
        let mut observed = expected.clone();
        observed.insert("evidence/x.pdf", Digest::of(b"tampered")).unwrap();

        let mut v = Verification::new();
        v.check_files(&expected, &observed).unwrap();
        v.check_chain(&events).unwrap();
        let report = v.finish().unwrap();

        assert_eq!(report.state, VerifyState::Failed);
        assert_eq!(report.failing_paths(), vec!["evidence/x.pdf"]);
        let b = report.chain_break().unwrap();
        assert_eq!(b.sequence, 0);
        assert_eq!(b.reason, BreakReason::PrevHashMismatch);
        assert!(report.summary().starts_with("FAIL: 2 failure(s)"));
    }

    #[test]
    fn test_structural_failure_fails_verdict() {
        let mut v = Verification::new();
        v.skip_files("manifest.json missing").unwrap();
        v.check_chain(&[]).unwrap();
        let report = v.finish().unwrap();
        assert!(!report.passed());
        assert!(report.lines().iter().any(|l| l.contains("manifest.json missing")));
    }
}
