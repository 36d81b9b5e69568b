//! Proof Pack Assembler.
//!
//! Lays a pack out in a directory:
//!
//! ```text
//! manifest.json          every other file -> sha256
//! timeline.json          the chained events
//! pack.json              pack id, event count, head hash
//! VERIFY.md              how to re-check the pack by hand
//! evidence/...           supporting files, copied byte for byte
//! bin/proofpack-verify   optional bundled verifier
//! ```
//!
//! Identical inputs give byte-identical `manifest.json`, `timeline.json` and
//! `pack.json`. Nothing in the layout depends on the clock or on directory
//! iteration order.

use crate::error::{PersistenceError, Result};
use crate::files;
use crate::hashing::{build_manifest, collect_files};
use proofpack_kernel::config::{
    EVIDENCE_DIR, GENESIS_HASH, MANIFEST_FILE, METHODOLOGY_FILE, RESERVED_FILES, VERIFIER_PATH,
};
use proofpack_kernel::event::EVENT_SCHEMA;
use proofpack_kernel::manifest::check_portable_path;
use proofpack_kernel::{CaptureEvent, Manifest, PackInfo};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct BuiltPack {
    pub dir: PathBuf,
    pub manifest: Manifest,
    pub info: PackInfo,
}

#[derive(Debug, Clone)]
pub struct PackBuilder {
    pack_id: String,
    events: Vec<CaptureEvent>,
    files: BTreeMap<String, Source>,
    verifier: Option<PathBuf>,
}

impl PackBuilder {
    pub fn new(pack_id: impl Into<String>, events: Vec<CaptureEvent>) -> Self {
        Self {
            pack_id: pack_id.into(),
            events,
            files: BTreeMap::new(),
            verifier: None,
        }
    }

    fn add(&mut self, pack_path: String, source: Source) -> Result<()> {
        check_portable_path(&pack_path)?;
        if RESERVED_FILES.contains(&pack_path.as_str()) {
            return Err(PersistenceError::ReservedPath(pack_path));
        }
        self.files.insert(pack_path, source);
        Ok(())
    }

    /// Adds in-memory evidence at `evidence/<name>`.
    pub fn evidence_bytes(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        self.add(format!("{EVIDENCE_DIR}/{name}"), Source::Bytes(bytes.into()))?;
        Ok(self)
    }

    /// Adds a file from disk at `evidence/<name>`.
    pub fn evidence_file(mut self, name: &str, path: impl Into<PathBuf>) -> Result<Self> {
        self.add(format!("{EVIDENCE_DIR}/{name}"), Source::File(path.into()))?;
        Ok(self)
    }

    /// Adds every regular file under `dir`, keeping its relative layout.
    pub fn evidence_dir(mut self, dir: &Path) -> Result<Self> {
        for (rel, abs) in collect_files(dir, &[])? {
            self.add(format!("{EVIDENCE_DIR}/{rel}"), Source::File(abs))?;
        }
        Ok(self)
    }

    /// Adds a file at an arbitrary pack path outside the reserved names.
    pub fn extra_file(mut self, pack_path: &str, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        self.add(pack_path.to_string(), Source::Bytes(bytes.into()))?;
        Ok(self)
    }

    /// Bundles a verifier executable at `bin/proofpack-verify`.
    pub fn verifier(mut self, path: impl Into<PathBuf>) -> Self {
        self.verifier = Some(path.into());
        self
    }

    pub fn pack_info(&self) -> PackInfo {
        PackInfo::for_events(self.pack_id.clone(), &self.events)
    }

    /// Writes the pack into `out`, which must not exist or be empty.
    pub fn write_dir(&self, out: &Path) -> Result<BuiltPack> {
        proofpack_kernel::verify_chain(&self.events).map_err(proofpack_kernel::KernelError::ChainBroken)?;
        prepare_output(out)?;

        let info = self.pack_info();
        files::write_timeline(out, &self.events)?;
        files::write_pack_info(out, &info)?;
        fs::write(out.join(METHODOLOGY_FILE), methodology())?;

        for (pack_path, source) in &self.files {
            let target = out.join(pack_path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            match source {
                Source::File(path) => {
                    fs::copy(path, &target)?;
                }
                Source::Bytes(bytes) => fs::write(&target, bytes)?,
            }
        }

        if let Some(verifier) = &self.verifier {
            let target = out.join(VERIFIER_PATH);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(verifier, &target)?;
            make_executable(&target)?;
        }

        let manifest = build_manifest(out, &[MANIFEST_FILE])?;
        files::write_manifest(out, &manifest)?;

        tracing::info!(
            dir = %out.display(),
            pack_id = %info.pack_id,
            events = info.event_count,
            files = manifest.len(),
            head = %info.head_hash,
            "built proof pack"
        );

        Ok(BuiltPack {
            dir: out.to_path_buf(),
            manifest,
            info,
        })
    }
}

/// File name of the verifier executable on this platform.
pub fn verifier_file_name() -> String {
    format!("proofpack-verify{}", std::env::consts::EXE_SUFFIX)
}

/// Finds a built `proofpack-verify` beside the running executable, or one
/// directory up (where cargo places binaries relative to `deps/`).
pub fn locate_verifier() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let name = verifier_file_name();
    exe.ancestors()
        .skip(1)
        .take(2)
        .map(|dir| dir.join(&name))
        .find(|candidate| candidate.is_file())
}

fn prepare_output(out: &Path) -> Result<()> {
    if out.exists() {
        if fs::read_dir(out)?.next().is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("output directory {} is not empty", out.display()),
            )
            .into());
        }
    } else {
        fs::create_dir_all(out)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Contents of `VERIFY.md`. Fixed text: it is hashed like every other file.
pub fn methodology() -> String {
    format!(
        "# Verifying this Proof Pack\n\
         \n\
         Run `bin/proofpack-verify` from this directory (if bundled), or repeat the\n\
         two checks below with any SHA-256 tool. No network access is needed.\n\
         \n\
         ## 1. File integrity\n\
         \n\
         `manifest.json` maps every file in the pack except itself to the lowercase hex\n\
         SHA-256 of its exact bytes. Every listed file must exist with that hash, and no\n\
         unlisted file may be present.\n\
         \n\
         ## 2. Hash chain\n\
         \n\
         `timeline.json` is an array of events ordered by `sequence`, starting at 0.\n\
         For each event, `this_hash` is the SHA-256 of these bytes, concatenated:\n\
         \n\
         1. `0x02`, u32 big-endian length, then the UTF-8 text `{schema}`\n\
         2. `0x01`, then `sequence` as u64 big-endian\n\
         3. `0x02`, u32 big-endian length, then `timestamp` as UTF-8 (`YYYY-MM-DDTHH:MM:SSZ`)\n\
         4. `0x02`, u32 big-endian length, then `subject` as UTF-8\n\
         5. `0x03`, then the 32 bytes of `payload_hash`\n\
         6. `0x03`, then the 32 bytes of `prev_hash`\n\
         \n\
         Event 0 has `prev_hash` equal to the genesis value\n\
         `{genesis}`.\n\
         Every later event has `prev_hash` equal to the previous event's `this_hash`, and\n\
         its `sequence` is one more than the previous one.\n\
         \n\
         The first event where any of these fails is where the record was altered.\n\
         `pack.json` records the event count and the last `this_hash`; a mismatch there\n\
         means events were dropped from the end.\n",
        schema = EVENT_SCHEMA.name,
        genesis = GENESIS_HASH,
    )
}
