use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use proofpack_kernel::config::{
    EVIDENCE_DIR, MANIFEST_FILE, METHODOLOGY_FILE, PACK_INFO_FILE, TIMELINE_FILE, VERIFIER_PATH,
};
use proofpack_persistence::files;
use std::path::Path;

/// Status table for the reserved files of a pack directory. Reports what is
/// there without judging integrity; `verify` does that.
pub fn run(dir: &Path) -> anyhow::Result<()> {
    println!("\nProof Pack Status Report: {}", dir.display());
    println!("--------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Details"]);

    // 1. Manifest
    if dir.join(MANIFEST_FILE).exists() {
        match files::read_manifest(dir) {
            Ok(m) => table.add_row(vec![MANIFEST_FILE, "FOUND", &format!("{} entries", m.len())]),
            Err(e) => table.add_row(vec![MANIFEST_FILE, "CORRUPT", &e.to_string()]),
        };
    } else {
        table.add_row(vec![MANIFEST_FILE, "MISSING", ""]);
    }

    // 2. Timeline
    if dir.join(TIMELINE_FILE).exists() {
        match files::read_timeline(dir) {
            Ok(events) => {
                let span = match (events.first(), events.last()) {
                    (Some(first), Some(last)) => format!(", {} .. {}", first.timestamp(), last.timestamp()),
                    _ => String::new(),
                };
                table.add_row(vec![TIMELINE_FILE, "FOUND", &format!("{} events{span}", events.len())])
            }
            Err(e) => table.add_row(vec![TIMELINE_FILE, "CORRUPT", &e.to_string()]),
        };
    } else {
        table.add_row(vec![TIMELINE_FILE, "MISSING", ""]);
    }

    // 3. Pack descriptor
    if dir.join(PACK_INFO_FILE).exists() {
        match files::read_pack_info(dir) {
            Ok(info) => table.add_row(vec![
                PACK_INFO_FILE,
                "FOUND",
                &format!(
                    "id {}, format v{}, {} events, head {}",
                    info.pack_id,
                    info.format_version,
                    info.event_count,
                    super::short(&info.head_hash)
                ),
            ]),
            Err(e) => table.add_row(vec![PACK_INFO_FILE, "CORRUPT", &e.to_string()]),
        };
    } else {
        table.add_row(vec![PACK_INFO_FILE, "MISSING", ""]);
    }

    // 4. Methodology and bundled verifier
    for (name, absent) in [(METHODOLOGY_FILE, "MISSING"), (VERIFIER_PATH, "NOT BUNDLED")] {
        let path = dir.join(name);
        if path.is_file() {
            let size = std::fs::metadata(&path)?.len();
            table.add_row(vec![name, "FOUND", &format!("{size} bytes")]);
        } else {
            table.add_row(vec![name, absent, ""]);
        }
    }

    // 5. Evidence
    let evidence = dir.join(EVIDENCE_DIR);
    if evidence.is_dir() {
        let count = proofpack_persistence::hashing::collect_files(&evidence, &[])?.len();
        table.add_row(vec![EVIDENCE_DIR, "FOUND", &format!("{count} files")]);
    } else {
        table.add_row(vec![EVIDENCE_DIR, "EMPTY", ""]);
    }

    println!("{table}\n");

    Ok(())
}
