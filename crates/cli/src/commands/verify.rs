use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use proofpack_kernel::chain::LinkStatus;
use proofpack_kernel::verify::BreakReasonLabel;
use proofpack_kernel::{FileStatus, Failure};
use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let report = proofpack_persistence::verify_path(path)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Check", "Item", "Status", "Details"]);

    for f in &report.files {
        let (status, details) = match &f.status {
            FileStatus::Ok => ("OK", String::new()),
            FileStatus::Mismatch { expected, actual } => {
                ("MISMATCH", format!("expected {}, found {}", super::short(expected), super::short(actual)))
            }
            FileStatus::Missing => ("MISSING", "listed in manifest, not present".to_string()),
            FileStatus::Extra => ("EXTRA", "present, not in manifest".to_string()),
        };
        table.add_row(vec!["file".to_string(), f.path.clone(), status.to_string(), details]);
    }

    for e in &report.events {
        let (status, details) = match &e.status {
            LinkStatus::Valid { this_hash } => ("OK", super::short(this_hash)),
            LinkStatus::Broken(reason) => ("BROKEN", format!("{} ({reason})", BreakReasonLabel(*reason))),
            LinkStatus::Unchecked => ("UNCHECKED", "after break".to_string()),
        };
        table.add_row(vec!["event".to_string(), e.sequence.to_string(), status.to_string(), details]);
    }

    for f in &report.failures {
        if let Failure::Structural(what) = f {
            table.add_row(vec!["structure".to_string(), String::new(), "INVALID".to_string(), what.clone()]);
        }
    }

    println!("\nProof Pack Verification: {}\n", path.display());
    println!("{table}\n");
    println!("{}\n", report.summary());

    if report.passed() {
        Ok(())
    } else {
        anyhow::bail!("verification failed with {} failure(s)", report.failures.len())
    }
}
