pub mod error;
pub mod files;
pub mod journal;
pub mod hashing;
pub mod assemble;
pub mod container;
pub mod verify;
pub mod fixtures;

pub use assemble::{locate_verifier, BuiltPack, PackBuilder};
pub use error::{PersistenceError, Result};
pub use journal::CaptureJournal;
pub use verify::{verify_container, verify_pack_dir, verify_path};
