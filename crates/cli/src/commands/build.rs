use anyhow::{bail, Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use proofpack_persistence::container::write_container;
use proofpack_persistence::journal::read_events;
use proofpack_persistence::{BuiltPack, PackBuilder};
use std::path::PathBuf;

use crate::config::ENV_VERIFIER;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub journal: PathBuf,
    pub out: PathBuf,
    pub pack_id: String,
    pub evidence: Option<PathBuf>,
    pub verifier: Option<PathBuf>,
    /// Build without `bin/proofpack-verify`. Off unless asked for.
    pub without_verifier: bool,
    pub archive: Option<PathBuf>,
}

pub fn build(opts: &BuildOptions) -> Result<BuiltPack> {
    let events = read_events(&opts.journal)
        .with_context(|| format!("Failed to load journal {}", opts.journal.display()))?;

    let mut builder = PackBuilder::new(opts.pack_id.clone(), events);
    if let Some(dir) = &opts.evidence {
        builder = builder
            .evidence_dir(dir)
            .with_context(|| format!("Failed to collect evidence from {}", dir.display()))?;
    }
    match (&opts.verifier, opts.without_verifier) {
        (_, true) => tracing::warn!("building without a bundled verifier; recipients must supply their own"),
        (Some(bin), false) => {
            if !bin.is_file() {
                bail!("Verifier executable {} not found", bin.display());
            }
            builder = builder.verifier(bin.clone());
        }
        (None, false) => bail!(
            "No proofpack-verify found to bundle: pass --verifier, set {}, or build with --no-verifier",
            ENV_VERIFIER
        ),
    }

    let built = builder
        .write_dir(&opts.out)
        .with_context(|| format!("Failed to build pack in {}", opts.out.display()))?;

    if let Some(archive) = &opts.archive {
        write_container(&built.dir, archive)
            .with_context(|| format!("Failed to write container {}", archive.display()))?;
    }
    Ok(built)
}

pub fn run(opts: &BuildOptions) -> Result<()> {
    let built = build(opts)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "SHA-256"]);
    for (path, digest) in built.manifest.iter() {
        table.add_row(vec![path.to_string(), digest.to_hex()]);
    }

    println!("\nProof Pack {}\n", built.info.pack_id);
    println!("{table}\n");
    println!("Events:    {}", built.info.event_count);
    println!("Head hash: {}", built.info.head_hash);
    println!("Directory: {}", built.dir.display());
    if let Some(archive) = &opts.archive {
        println!("Container: {}", archive.display());
    }
    Ok(())
}
