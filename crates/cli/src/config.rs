//! Operator defaults.
//!
//! Resolution order: built-in defaults, then `PROOFPACK_*` environment
//! variables, then command-line flags.

use proofpack_persistence::locate_verifier;
use std::path::PathBuf;

pub const ENV_JOURNAL: &str = "PROOFPACK_JOURNAL";
pub const ENV_OUT: &str = "PROOFPACK_OUT";
pub const ENV_PACK_ID: &str = "PROOFPACK_PACK_ID";
pub const ENV_VERIFIER: &str = "PROOFPACK_VERIFIER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    pub journal: PathBuf,
    pub out_dir: PathBuf,
    pub pack_id: String,
    /// Verifier executable to bundle into built packs. Defaults to the
    /// `proofpack-verify` installed beside this binary.
    pub verifier: Option<PathBuf>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            journal: PathBuf::from("events.journal"),
            out_dir: PathBuf::from("proofpack"),
            pack_id: "proofpack".to_string(),
            verifier: locate_verifier(),
        }
    }
}

impl PackConfig {
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Empty values are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(v) = get(ENV_JOURNAL) {
            self.journal = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_OUT) {
            self.out_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_PACK_ID) {
            self.pack_id = v;
        }
        if let Some(v) = get(ENV_VERIFIER) {
            self.verifier = Some(PathBuf::from(v));
        }
        self
    }
}
