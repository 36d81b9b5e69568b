//! Deterministic `.tar.gz` containers.
//!
//! Entries are regular files only, sorted by path, with fixed mtime, mode,
//! owner and gzip header, so the same pack directory always packs to the same
//! bytes. Readers refuse absolute paths, `..` and anything that is not a plain
//! file or directory.

use crate::error::{PersistenceError, Result};
use crate::hashing::collect_files;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use proofpack_kernel::config::{CONTAINER_MTIME, VERIFIER_PATH};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, EntryType, Header};

/// Packs every file under `dir` into `out`.
pub fn write_container(dir: &Path, out: &Path) -> Result<()> {
    let files = collect_files(dir, &[])?;

    let encoder = GzEncoder::new(BufWriter::new(File::create(out)?), Compression::default());
    let mut archive = Builder::new(encoder);

    for (rel, abs) in &files {
        let file = File::open(abs)?;
        let size = file.metadata()?.len();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_mode(if rel == VERIFIER_PATH { 0o755 } else { 0o644 });
        header.set_uid(0);
        header.set_gid(0);
        header.set_size(size);
        header.set_mtime(CONTAINER_MTIME);
        header.set_cksum();

        archive.append_data(&mut header, rel, file)?;
    }

    let encoder = archive.into_inner()?;
    let mut writer = encoder.finish()?;
    std::io::Write::flush(&mut writer)?;

    tracing::info!(container = %out.display(), entries = files.len(), "wrote pack container");
    Ok(())
}

/// Pack-relative path of an archive entry, or `None` for entries that carry
/// no file (directories and the `./` root).
fn checked_entry_path(path: &Path, kind: EntryType) -> Result<Option<String>> {
    let unsafe_entry = |why| PersistenceError::UnsafeEntry {
        path: path.to_path_buf(),
        why,
    };

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                parts.push(part.to_str().ok_or_else(|| unsafe_entry("name is not UTF-8"))?)
            }
            Component::ParentDir => return Err(unsafe_entry("parent directory component")),
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_entry("absolute path")),
        }
    }

    match kind {
        EntryType::Directory => Ok(None),
        EntryType::Regular | EntryType::Continuous => {
            if parts.is_empty() {
                return Err(unsafe_entry("empty file name"));
            }
            Ok(Some(parts.join("/")))
        }
        _ => Err(unsafe_entry("not a regular file")),
    }
}

/// Upper bound on how much of an entry's declared size is reserved up front.
const PREALLOC_LIMIT: u64 = 64 * 1024;

/// Reads every file of a gzip'd tar stream into memory, keyed by pack path.
///
/// Header sizes are not trusted: an entry whose data ends before its declared
/// size is a corruption error.
pub fn read_archive<R: Read>(reader: R) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut files = BTreeMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let Some(rel) = checked_entry_path(&entry_path, entry.header().entry_type())? else {
            continue;
        };

        let declared = entry.size();
        let mut bytes = Vec::with_capacity(declared.min(PREALLOC_LIMIT) as usize);
        (&mut entry).take(declared).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != declared {
            return Err(PersistenceError::Corrupted(format!(
                "container entry {rel} holds {} of {declared} bytes",
                bytes.len()
            )));
        }

        if files.insert(rel.clone(), bytes).is_some() {
            return Err(PersistenceError::UnsafeEntry {
                path: PathBuf::from(rel),
                why: "duplicate entry",
            });
        }
    }

    Ok(files)
}

/// Reads every file of a container into memory, keyed by pack path.
pub fn read_container(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    read_archive(BufReader::new(File::open(path)?))
}

/// Extracts a container into `dest` (created if missing).
pub fn extract_container(path: &Path, dest: &Path) -> Result<()> {
    let files = read_container(path)?;
    fs::create_dir_all(dest)?;

    for (rel, bytes) in &files {
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        #[cfg(unix)]
        if rel == VERIFIER_PATH {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
        }
    }

    tracing::debug!(container = %path.display(), dest = %dest.display(), files = files.len(), "extracted pack");
    Ok(())
}
