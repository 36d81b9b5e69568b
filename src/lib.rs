// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! proofpack-kernel: hash-chained capture timelines and the Proof Pack verification model.
//!
//! Everything in this crate is pure computation. File walking, container
//! packing and the on-disk journal live in `proofpack-persistence`.

pub mod config;
pub mod error;
pub mod types;
pub mod encode;
pub mod event;
pub mod timeline;
pub mod chain;
pub mod manifest;
pub mod proof;
pub mod verify;

pub use chain::{verify_chain, BreakReason, ChainBreak};
pub use error::{KernelError, KernelResult, Result};
pub use event::CaptureEvent;
pub use manifest::{FileCheck, FileStatus, Manifest};
pub use proof::PackInfo;
pub use timeline::Timeline;
pub use types::digest::Digest;
pub use types::timestamp::Timestamp;
pub use verify::{EventCheck, Failure, Verification, VerificationReport, VerifyState};

#[cfg(test)]
pub mod tests;
