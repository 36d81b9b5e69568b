// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Protocol constants.
//!
//! Changing any of these changes the bytes of every pack, so they are
//! versioned together through [`FORMAT_VERSION`].

use crate::types::digest::Digest;

/// Version of the pack layout and event encoding.
pub const FORMAT_VERSION: u32 = 1;

/// The only content hash algorithm a pack may declare.
pub const HASH_ALGO: &str = "sha256";

/// `prev_hash` of the event with sequence 0 (64 zero hex digits).
pub const GENESIS_HASH: Digest = Digest::ZERO;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const TIMELINE_FILE: &str = "timeline.json";
pub const PACK_INFO_FILE: &str = "pack.json";
pub const METHODOLOGY_FILE: &str = "VERIFY.md";

/// Directory (inside the pack) holding supporting evidence files.
pub const EVIDENCE_DIR: &str = "evidence";

/// Location of the bundled offline verifier executable.
pub const VERIFIER_PATH: &str = "bin/proofpack-verify";

/// Files whose names the assembler owns. Evidence may never shadow them.
pub const RESERVED_FILES: [&str; 5] = [
    MANIFEST_FILE,
    TIMELINE_FILE,
    PACK_INFO_FILE,
    METHODOLOGY_FILE,
    VERIFIER_PATH,
];

/// mtime stamped on every container entry (2024-01-01T00:00:00Z).
pub const CONTAINER_MTIME: u64 = 1_704_067_200;

/// First four bytes of a capture journal.
pub const JOURNAL_MAGIC: [u8; 4] = *b"PPJL";

/// Journal layout version written into its header.
pub const JOURNAL_VERSION: u32 = 1;
