//! File Manifest Builder.
//!
//! Walks a pack directory, hashes every regular file with streaming SHA-256
//! (in parallel) and merges the results into a sorted [`Manifest`]. Only the
//! bytes on disk are hashed; `timeline.json` is treated like any other file.

use crate::error::{PersistenceError, Result};
use proofpack_kernel::{Digest, Manifest};
use rayon::prelude::*;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 of a file's exact bytes.
pub fn hash_file(path: impl AsRef<Path>) -> Result<Digest> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let bytes: [u8; 32] = hasher.finalize().into();
    Ok(Digest::from(bytes))
}

/// `/`-joined path of `path` relative to `root`.
pub fn portable_relative(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| PersistenceError::UnsafeEntry {
        path: path.to_path_buf(),
        why: "outside pack root",
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(s) => parts.push(s),
                None => {
                    return Err(PersistenceError::UnsafeEntry {
                        path: path.to_path_buf(),
                        why: "file name is not UTF-8",
                    })
                }
            },
            _ => {
                return Err(PersistenceError::UnsafeEntry {
                    path: path.to_path_buf(),
                    why: "non-normal path component",
                })
            }
        }
    }
    Ok(parts.join("/"))
}

/// Every regular file under `root`, sorted by portable path, minus `exclude`.
///
/// Symlinks and special files are refused: the manifest must describe
/// exactly the bytes a verifier will read.
pub fn collect_files(root: &Path, exclude: &[&str]) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            return Err(PersistenceError::UnsafeEntry {
                path: entry.path().to_path_buf(),
                why: "not a regular file",
            });
        }

        let rel = portable_relative(root, entry.path())?;
        if exclude.contains(&rel.as_str()) {
            continue;
        }
        files.push((rel, entry.into_path()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Hashes every file under `root` except those in `exclude`.
pub fn build_manifest(root: &Path, exclude: &[&str]) -> Result<Manifest> {
    let files = collect_files(root, exclude)?;

    let hashed: Vec<(String, Digest)> = files
        .par_iter()
        .map(|(rel, abs)| -> Result<(String, Digest)> {
            let digest = hash_file(abs)?;
            tracing::debug!(path = %rel, sha256 = %digest, "hashed pack file");
            Ok((rel.clone(), digest))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut manifest = Manifest::new();
    for (rel, digest) in hashed {
        manifest.insert(rel, digest)?;
    }
    Ok(manifest)
}
