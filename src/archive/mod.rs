//! Archive transformers
//!
//! The patchers never touch ZIP or tar internals themselves. They describe each
//! step (replace an entry, pull a directory out, put it back) and an
//! [`ArchiveTransformer`] carries it out. No transformer recomputes digests;
//! keeping RECORD consistent is the caller's job.

mod command;
mod native;

use std::path::Path;

pub use command::CommandArchiver;
pub use command::run_command;
pub use native::NativeArchiver;

use crate::error::PatchError;

/// Operations the wheel and sdist patchers need from an archive backend.
///
/// Every call is a complete open/modify/close cycle on the archive file.
pub trait ArchiveTransformer: Send + Sync {
    /// Replace the contents of an existing ZIP entry
    fn replace_entry(&self, archive: &Path, entry: &str, contents: &[u8])
        -> Result<(), PatchError>;

    /// Extract the named ZIP entries below `dest`, keeping their paths
    fn extract_entries(&self, archive: &Path, entries: &[String], dest: &Path)
        -> Result<(), PatchError>;

    /// Remove the named entries from a ZIP archive
    fn delete_entries(&self, archive: &Path, entries: &[String]) -> Result<(), PatchError>;

    /// Add the directory `base/dir_name` recursively, stored as `dir_name/...`
    fn add_tree(&self, archive: &Path, base: &Path, dir_name: &str) -> Result<(), PatchError>;

    /// Unpack a gzip tarball into `dest`
    fn extract_tarball(&self, tarball: &Path, dest: &Path) -> Result<(), PatchError>;

    /// Write `base/dir_name` as a gzip tarball at `tarball`, rooted at `dir_name`
    fn create_tarball(&self, tarball: &Path, base: &Path, dir_name: &str)
        -> Result<(), PatchError>;
}
