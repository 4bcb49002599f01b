//! Wheel patcher - republishes a wheel under the fork name
//!
//! Steps run strictly in order, each one a separate pass over the archive:
//! rewrite METADATA, rewrite RECORD, inject the tracked sources, move the
//! dist-info directory, then verify RECORD against what was written.

use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing::debug;
use tracing::instrument;

use crate::archive::ArchiveTransformer;
use crate::config::ForkConfig;
use crate::error::PatchError;
use crate::metadata::rewrite_metadata;
use crate::name::fork_name;
use crate::record::rewrite_record;
use crate::wheel::WheelReader;
use crate::wheel::WheelScan;
use crate::wheel::verify_patched;

/// Patches wheels in place
pub struct WheelPatcher<'a> {
    config: &'a ForkConfig,
    archiver: &'a dyn ArchiveTransformer,
}

impl<'a> WheelPatcher<'a> {
    pub fn new(config: &'a ForkConfig, archiver: &'a dyn ArchiveTransformer) -> Self {
        Self { config, archiver }
    }

    /// Patch the wheel at `path`, rewriting the file in place
    #[instrument(skip_all, fields(wheel = %path.display()))]
    pub fn patch(&self, path: &Path) -> Result<(), PatchError> {
        let scan = WheelReader::open(path)?.scan()?;
        let sources = self.config.read_tracked_sources()?;

        let metadata = rewrite_metadata(&scan.metadata, self.config);

        // METADATA is rewritten too, so its RECORD line is recomputed with the sources
        let mut replaced = sources.clone();
        replaced.push((scan.metadata_path.clone(), metadata.clone().into_bytes()));
        let record = rewrite_record(&scan.record, &replaced, self.config);

        debug!("replacing {} and {}", scan.metadata_path, scan.record_path);
        self.archiver
            .replace_entry(path, &scan.metadata_path, metadata.as_bytes())?;
        self.archiver
            .replace_entry(path, &scan.record_path, record.as_bytes())?;

        for (tracked, bytes) in &sources {
            debug!("injecting {}", tracked);
            self.archiver.replace_entry(path, tracked, bytes)?;
        }

        let dist_info = self.rename_dist_info(path, &scan)?;

        let mut verify: Vec<String> = sources.into_iter().map(|(tracked, _)| tracked).collect();
        verify.push(format!("{}/METADATA", dist_info));
        verify_patched(path, &verify)?;

        Ok(())
    }

    /// Move every dist-info entry under the forked directory name.
    ///
    /// Returns the new directory name.
    fn rename_dist_info(&self, path: &Path, scan: &WheelScan) -> Result<String, PatchError> {
        let scratch = TempDir::new()?;
        self.archiver
            .extract_entries(path, &scan.dist_info_entries, scratch.path())?;
        self.archiver.delete_entries(path, &scan.dist_info_entries)?;

        let extracted = find_dist_info_dir(scratch.path(), &self.config.dist_name(), path)?;
        let old_name = extracted
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_name = fork_name(
            &old_name,
            &self.config.dist_name(),
            &self.config.fork_dist_name(),
        );

        debug!("renaming {} to {}", old_name, new_name);
        std::fs::rename(&extracted, scratch.path().join(&new_name))?;
        self.archiver.add_tree(path, scratch.path(), &new_name)?;

        Ok(new_name)
    }
}

/// Find the one `<dist_name>-*.dist-info` directory below `dir`
fn find_dist_info_dir(dir: &Path, dist_name: &str, wheel: &Path) -> Result<PathBuf, PatchError> {
    let pattern = format!(
        "{}/{}-*.dist-info",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(dist_name)
    );
    let mut matches = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| PatchError::malformed(wheel, e.to_string()))? {
        matches.push(entry.map_err(|e| PatchError::Io(e.into_error()))?);
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        n => Err(PatchError::malformed(
            wheel,
            format!("expected one {}-*.dist-info directory, found {}", dist_name, n),
        )),
    }
}
