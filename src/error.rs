// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use crate::chain::ChainBreak;
use crate::verify::VerifyState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A record was encoded without honouring its schema. Programmer error.
    #[error("encoding contract violated for `{schema}`: field `{field}`")]
    EncodingContract { schema: &'static str, field: String },

    #[error("chain broken at sequence {}: {}", .0.sequence, .0.reason)]
    ChainBroken(ChainBreak),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid manifest path: {0}")]
    InvalidPath(String),

    #[error("structural failure: {0}")]
    Structural(String),

    #[error("illegal verification transition {from:?} -> {to:?}")]
    InvalidTransition { from: VerifyState, to: VerifyState },
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
