// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Offline Proof Pack verifier.
//!
//! Runs with no network, configuration or credentials. Exit status:
//! `0` PASS, `1` FAIL, `2` the pack could not be read at all.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_FAIL: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Extracted pack directory or `.tar.gz` container. Defaults to the
    /// current directory so the bundled copy can run from inside the pack.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Print only the final PASS/FAIL line.
    #[arg(long, short)]
    quiet: bool,
}

fn run(args: &Args) -> Result<bool> {
    let report = proofpack_persistence::verify_path(&args.path)
        .with_context(|| format!("Failed to open pack at {}", args.path.display()))?;

    if args.quiet {
        println!("{}", report.summary());
    } else {
        for line in report.lines() {
            println!("{line}");
        }
    }
    Ok(report.passed())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "proofpack=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    eprintln!("Proof Pack Verifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "Protocol: format v{}, {}, genesis {}",
        proofpack_kernel::config::FORMAT_VERSION,
        proofpack_kernel::config::HASH_ALGO,
        proofpack_kernel::config::GENESIS_HASH
    );

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAIL),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
