// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! File manifest model.
//!
//! A manifest maps portable relative paths (`/`-separated, no `..`) to the
//! SHA-256 of the file's exact bytes. Keys are kept in a `BTreeMap` so the
//! persisted form is sorted bytewise regardless of discovery order.

use crate::error::{KernelError, Result};
use crate::types::digest::Digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Digest>", into = "BTreeMap<String, Digest>")]
pub struct Manifest {
    entries: BTreeMap<String, Digest>,
}

/// Outcome of comparing one path between an expected and an observed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Ok,
    Mismatch { expected: Digest, actual: Digest },
    /// Listed but not present.
    Missing,
    /// Present but not listed.
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub path: String,
    pub status: FileStatus,
}

impl FileCheck {
    pub fn is_ok(&self) -> bool {
        self.status == FileStatus::Ok
    }
}

/// Validates a manifest path and returns it unchanged.
///
/// Backslashes are rejected rather than converted: callers building from disk
/// join components with `/` themselves.
pub fn check_portable_path(path: &str) -> Result<&str> {
    let bad = |why: &str| KernelError::InvalidPath(format!("{path:?}: {why}"));
    if path.is_empty() {
        return Err(bad("empty"));
    }
    if path.starts_with('/') {
        return Err(bad("absolute"));
    }
    if path.contains('\\') {
        return Err(bad("backslash separator"));
    }
    if path.contains('\0') {
        return Err(bad("NUL byte"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(bad("empty component")),
            "." | ".." => return Err(bad("relative component")),
            _ => {}
        }
    }
    Ok(path)
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `path`.
    pub fn insert(&mut self, path: impl Into<String>, digest: Digest) -> Result<()> {
        let path = path.into();
        check_portable_path(&path)?;
        self.entries.insert(path, digest);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Digest)> {
        self.entries.iter().map(|(p, d)| (p.as_str(), d))
    }

    /// Compares `self` (expected) against what is actually on disk. Every path
    /// in either manifest yields exactly one check, in sorted order.
    pub fn compare(&self, observed: &Manifest) -> Vec<FileCheck> {
        let mut paths: Vec<&String> = self.entries.keys().chain(observed.entries.keys()).collect();
        paths.sort();
        paths.dedup();

        paths
            .into_iter()
            .map(|path| {
                let status = match (self.entries.get(path), observed.entries.get(path)) {
                    (Some(e), Some(a)) if e == a => FileStatus::Ok,
                    (Some(e), Some(a)) => FileStatus::Mismatch {
                        expected: *e,
                        actual: *a,
                    },
                    (Some(_), None) => FileStatus::Missing,
                    (None, _) => FileStatus::Extra,
                };
                FileCheck {
                    path: path.clone(),
                    status,
                }
            })
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Digest>> for Manifest {
    type Error = KernelError;

    fn try_from(entries: BTreeMap<String, Digest>) -> Result<Self> {
        for path in entries.keys() {
            check_portable_path(path)?;
        }
        Ok(Self { entries })
    }
}

impl From<Manifest> for BTreeMap<String, Digest> {
    fn from(m: Manifest) -> Self {
        m.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(pairs: &[(&str, &[u8])]) -> Manifest {
        let mut m = Manifest::new();
        for (p, data) in pairs {
            m.insert(*p, Digest::of(data)).unwrap();
        }
        m
    }

    #[test]
    fn test_identical_manifests_all_ok() {
        let m = manifest(&[("a.txt", b"a"), ("evidence/b.pdf", b"b")]);
        let checks = m.compare(&m.clone());
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(FileCheck::is_ok));
    }

    #[test]
    fn test_mismatch_missing_extra_reported_per_path() {
        let expected = manifest(&[("a", b"a"), ("b", b"b"), ("c", b"c")]);
        let observed = manifest(&[("a", b"a"), ("b", b"B"), ("d", b"d")]);

        let checks = expected.compare(&observed);
        let by_path: Vec<(&str, &FileStatus)> = checks.iter().map(|c| (c.path.as_str(), &c.status)).collect();

        assert_eq!(by_path[0], ("a", &FileStatus::Ok));
        assert!(matches!(by_path[1], ("b", FileStatus::Mismatch { .. })));
        assert_eq!(by_path[2], ("c", &FileStatus::Missing));
        assert_eq!(by_path[3], ("d", &FileStatus::Extra));
    }

    #[test]
    fn test_non_portable_paths_rejected() {
        let mut m = Manifest::new();
        for bad in ["", "/etc/passwd", "a/../b", "./a", "a//b", "a\\b", "a/"] {
            assert!(m.insert(bad, Digest::ZERO).is_err(), "{bad:?} accepted");
        }
        assert!(m.insert("evidence/report.pdf", Digest::ZERO).is_ok());
    }

    #[test]
    fn test_json_is_sorted_mapping() {
        let m = manifest(&[("z.txt", b"z"), ("a.txt", b"a"), ("B.txt", b"b")]);
        let json = serde_json::to_string(&m).unwrap();
        let a = json.find("\"B.txt\"").unwrap();
        let b = json.find("\"a.txt\"").unwrap();
        let c = json.find("\"z.txt\"").unwrap();
        assert!(a < b && b < c);

        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_json_with_bad_path_rejected() {
        let json = format!("{{\"../escape\": \"{}\"}}", Digest::ZERO);
        assert!(serde_json::from_str::<Manifest>(&json).is_err());
    }
}
