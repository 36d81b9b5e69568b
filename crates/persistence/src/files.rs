//! `timeline.json`, `manifest.json` and `pack.json`.
//!
//! All three are pretty-printed JSON with a trailing newline. Writers are
//! deterministic; readers are strict, and anything they reject is a
//! structural failure of the pack.

use crate::error::{PersistenceError, Result};
use proofpack_kernel::config::{MANIFEST_FILE, PACK_INFO_FILE, TIMELINE_FILE};
use proofpack_kernel::{CaptureEvent, Manifest, PackInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Canonical bytes of a pack JSON document.
pub fn to_pack_json<T: Serialize + ?Sized>(name: &str, value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::json(name, e))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let bytes = to_pack_json(name, value)?;
    let mut file = File::create(dir.join(name))?;
    file.write_all(&bytes)?;
    file.sync_data()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let bytes = fs::read(dir.join(name))?;
    serde_json::from_slice(&bytes).map_err(|e| PersistenceError::json(name, e))
}

pub fn write_timeline(dir: &Path, events: &[CaptureEvent]) -> Result<()> {
    write_json(dir, TIMELINE_FILE, events)
}

pub fn read_timeline(dir: &Path) -> Result<Vec<CaptureEvent>> {
    read_json(dir, TIMELINE_FILE)
}

pub fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<()> {
    write_json(dir, MANIFEST_FILE, manifest)
}

pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    read_json(dir, MANIFEST_FILE)
}

pub fn write_pack_info(dir: &Path, info: &PackInfo) -> Result<()> {
    write_json(dir, PACK_INFO_FILE, info)
}

pub fn read_pack_info(dir: &Path) -> Result<PackInfo> {
    read_json(dir, PACK_INFO_FILE)
}
