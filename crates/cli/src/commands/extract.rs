use anyhow::{bail, Context, Result};
use proofpack_persistence::container::extract_container;
use std::fs;
use std::path::Path;

/// Unpacks a container so the bundled verifier can run inside it.
pub fn run(archive: &Path, dest: &Path) -> Result<()> {
    if dest.exists() && fs::read_dir(dest)?.next().is_some() {
        bail!("Destination {} is not empty", dest.display());
    }

    extract_container(archive, dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;

    println!("Extracted {} into {}", archive.display(), dest.display());
    println!("Run bin/proofpack-verify from that directory to check it offline.");
    Ok(())
}
