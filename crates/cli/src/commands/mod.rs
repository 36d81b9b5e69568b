pub mod build;
pub mod capture;
pub mod extract;
pub mod inspect;
pub mod timeline;
pub mod verify;

/// First 16 hex digits, for table cells.
pub(crate) fn short(digest: &proofpack_kernel::Digest) -> String {
    digest.to_hex()[..16].to_string()
}
