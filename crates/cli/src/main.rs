use clap::{Args, Parser, Subcommand};
use proofpack_cli::commands::build::BuildOptions;
use proofpack_cli::commands::capture::Payload;
use proofpack_cli::commands::timeline::TimelineSource;
use proofpack_cli::commands::{build, capture, extract, inspect, timeline, verify};
use proofpack_cli::config::PackConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "proofpack")]
#[command(about = "Proof Pack CLI - tamper-evident capture timelines and offline-verifiable evidence packs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PayloadArgs {
    /// File whose bytes are the captured material
    #[arg(long)]
    payload_file: Option<PathBuf>,

    /// Precomputed lowercase hex SHA-256 of the captured material
    #[arg(long)]
    payload_hash: Option<String>,
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct TimelineArgs {
    /// Read events from a capture journal
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Read timeline.json from a pack directory
    #[arg(long)]
    pack: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one capture in the journal.
    Capture {
        /// Journal file (default: $PROOFPACK_JOURNAL or events.journal)
        #[arg(long, short)]
        journal: Option<PathBuf>,

        /// What was captured: a URL or any opaque identifier
        #[arg(long, short)]
        subject: String,

        #[command(flatten)]
        payload: PayloadArgs,

        /// Capture time (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Build a Proof Pack from the journal.
    Build {
        #[arg(long, short)]
        journal: Option<PathBuf>,

        /// Output directory (must be empty or absent)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Directory of supporting evidence files
        #[arg(long, short)]
        evidence: Option<PathBuf>,

        #[arg(long)]
        pack_id: Option<String>,

        /// Verifier executable to bundle as bin/proofpack-verify
        /// (default: $PROOFPACK_VERIFIER or the one installed beside proofpack)
        #[arg(long)]
        verifier: Option<PathBuf>,

        /// Build a pack that carries no verifier
        #[arg(long, conflicts_with = "verifier")]
        no_verifier: bool,

        /// Also write a deterministic .tar.gz container
        #[arg(long, short)]
        archive: Option<PathBuf>,
    },
    /// Verify a pack directory or container
    Verify {
        path: PathBuf,
    },
    /// List the capture timeline
    Timeline {
        #[command(flatten)]
        source: TimelineArgs,
    },
    /// Show which pack files are present
    Inspect {
        dir: PathBuf,
    },
    /// Unpack a container into an empty directory
    Extract {
        archive: PathBuf,
        dest: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "proofpack=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    eprintln!("proofpack v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let cfg = PackConfig::from_env();

    match cli.command {
        Commands::Capture {
            journal,
            subject,
            payload,
            at,
        } => {
            let payload = match (payload.payload_file, payload.payload_hash) {
                (Some(file), _) => Payload::File(file),
                (None, Some(hash)) => Payload::Hash(hash),
                (None, None) => anyhow::bail!("one of --payload-file or --payload-hash is required"),
            };
            capture::run(
                &journal.unwrap_or(cfg.journal),
                &subject,
                &payload,
                at.as_deref(),
            )
        }
        Commands::Build {
            journal,
            out,
            evidence,
            pack_id,
            verifier,
            no_verifier,
            archive,
        } => build::run(&BuildOptions {
            journal: journal.unwrap_or(cfg.journal),
            out: out.unwrap_or(cfg.out_dir),
            pack_id: pack_id.unwrap_or(cfg.pack_id),
            evidence,
            verifier: verifier.or(cfg.verifier),
            without_verifier: no_verifier,
            archive,
        }),
        Commands::Verify { path } => verify::run(&path),
        Commands::Timeline { source } => {
            let source = match (source.journal, source.pack) {
                (_, Some(dir)) => TimelineSource::Pack(dir),
                (Some(path), None) => TimelineSource::Journal(path),
                (None, None) => TimelineSource::Journal(cfg.journal),
            };
            timeline::run(&source)
        }
        Commands::Inspect { dir } => inspect::run(&dir),
        Commands::Extract { archive, dest } => extract::run(&archive, &dest),
    }
}
