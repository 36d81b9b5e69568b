use proofpack_kernel::KernelError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid magic bytes in journal header")]
    InvalidMagic,
    #[error("Unsupported journal version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch at sequence {sequence}: expected {expected:016x}, found {found:016x}")]
    ChecksumMismatch {
        sequence: u64,
        expected: u64,
        found: u64,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Corrupted {0}")]
    Corrupted(String),
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error("{0} is reserved for the pack layout")]
    ReservedPath(String),
    #[error("Refusing unsafe entry {path:?}: {why}")]
    UnsafeEntry { path: PathBuf, why: &'static str },
}

impl PersistenceError {
    pub(crate) fn json(file: impl Into<String>, source: serde_json::Error) -> Self {
        PersistenceError::Json {
            file: file.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
