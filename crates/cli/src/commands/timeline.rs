use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use proofpack_kernel::chain::{walk_chain, LinkStatus};
use proofpack_kernel::CaptureEvent;
use proofpack_persistence::{files, journal};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum TimelineSource {
    Journal(PathBuf),
    Pack(PathBuf),
}

pub fn load(source: &TimelineSource) -> Result<Vec<CaptureEvent>> {
    match source {
        TimelineSource::Journal(path) => journal::read_events(path)
            .with_context(|| format!("Failed to read journal {}", path.display())),
        TimelineSource::Pack(dir) => files::read_timeline(dir)
            .with_context(|| format!("Failed to read timeline.json in {}", dir.display())),
    }
}

pub fn run(source: &TimelineSource) -> Result<()> {
    let events = load(source)?;
    let walk = walk_chain(&events);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Seq", "Captured (UTC)", "Subject", "Payload", "Hash", "Chain"]);

    for (event, (_, status)) in events.iter().zip(&walk.links) {
        let captured = event
            .timestamp()
            .as_datetime()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let chain = match status {
            LinkStatus::Valid { .. } => "ok".to_string(),
            LinkStatus::Broken(reason) => format!("BROKEN: {reason}"),
            LinkStatus::Unchecked => "-".to_string(),
        };
        table.add_row(vec![
            event.sequence().to_string(),
            captured,
            event.subject().to_string(),
            super::short(event.payload_hash()),
            super::short(event.this_hash()),
            chain,
        ]);
    }

    println!("\nCapture Timeline\n");
    println!("{table}\n");
    match walk.broken {
        None => println!("{} events, head {}", events.len(), walk.head()),
        Some(b) => println!(
            "\n⚠️  WARNING: chain broken at sequence {} ({}). Later events are untrusted.\n",
            b.sequence, b.reason
        ),
    }
    Ok(())
}
