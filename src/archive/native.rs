//! In-process archive transformer
//!
//! ZIP entries are rewritten by copying every untouched entry as raw compressed
//! bytes into a fresh archive next to the original, which then replaces it.
//! Sdists go through `tar` + `flate2`.

use std::collections::HashSet;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::ArchiveTransformer;
use crate::error::PatchError;

/// Archive transformer backed by the `zip`, `tar` and `flate2` crates
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeArchiver;

/// What to do with one entry while rewriting an archive
enum EntryAction<'a> {
    Keep,
    Drop,
    Replace(&'a [u8]),
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

/// Rewrite `archive` in place, deciding per entry name what happens to it.
///
/// Returns the number of entries that were not kept as-is.
fn rewrite_archive<'a>(
    archive: &Path,
    mut action: impl FnMut(&str) -> EntryAction<'a>,
) -> Result<usize, PatchError> {
    let mut source = ZipArchive::new(BufReader::new(File::open(archive)?))?;

    let dir = archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let output = NamedTempFile::new_in(dir)?;
    let mut writer = ZipWriter::new(output.as_file().try_clone()?);
    let mut touched = 0;

    for i in 0..source.len() {
        let entry = source.by_index_raw(i)?;
        let name = entry.name().to_string();

        match action(&name) {
            EntryAction::Keep => writer.raw_copy_file(entry)?,
            EntryAction::Drop => touched += 1,
            EntryAction::Replace(contents) => {
                let mut options = file_options();
                if let Some(mode) = entry.unix_mode() {
                    options = options.unix_permissions(mode);
                }
                drop(entry);
                writer.start_file(name.as_str(), options)?;
                writer.write_all(contents)?;
                touched += 1;
            }
        }
    }

    writer.finish()?;
    drop(source);
    output.persist(archive).map_err(|e| e.error)?;

    Ok(touched)
}

impl ArchiveTransformer for NativeArchiver {
    fn replace_entry(
        &self,
        archive: &Path,
        entry: &str,
        contents: &[u8],
    ) -> Result<(), PatchError> {
        let replaced = rewrite_archive(archive, |name| {
            if name == entry {
                EntryAction::Replace(contents)
            } else {
                EntryAction::Keep
            }
        })?;

        if replaced == 0 {
            return Err(PatchError::malformed(
                archive,
                format!("no entry named {}", entry),
            ));
        }
        Ok(())
    }

    fn extract_entries(
        &self,
        archive: &Path,
        entries: &[String],
        dest: &Path,
    ) -> Result<(), PatchError> {
        let mut source = ZipArchive::new(BufReader::new(File::open(archive)?))?;

        for name in entries {
            let mut file = source.by_name(name)?;
            let relative = file
                .enclosed_name()
                .ok_or_else(|| PatchError::malformed(archive, format!("unsafe path {}", name)))?;
            let target = dest.join(relative);

            if file.is_dir() {
                std::fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut file, &mut out)?;
        }

        Ok(())
    }

    fn delete_entries(&self, archive: &Path, entries: &[String]) -> Result<(), PatchError> {
        let doomed: HashSet<&str> = entries.iter().map(String::as_str).collect();
        rewrite_archive(archive, |name| {
            if doomed.contains(name) {
                EntryAction::Drop
            } else {
                EntryAction::Keep
            }
        })?;
        Ok(())
    }

    fn add_tree(&self, archive: &Path, base: &Path, dir_name: &str) -> Result<(), PatchError> {
        let file = OpenOptions::new().read(true).write(true).open(archive)?;
        let mut writer = ZipWriter::new_append(file)?;
        let options = file_options();

        for entry in WalkDir::new(base.join(dir_name)).sort_by_file_name() {
            let entry = entry.map_err(|e| PatchError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(base)
                .map_err(|_| PatchError::malformed(archive, "tree outside of base"))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                writer.add_directory(name, options)?;
            } else {
                writer.start_file(name, options)?;
                let mut source = File::open(entry.path())?;
                std::io::copy(&mut source, &mut writer)?;
            }
        }

        writer.finish()?;
        Ok(())
    }

    fn extract_tarball(&self, tarball: &Path, dest: &Path) -> Result<(), PatchError> {
        let decoder = GzDecoder::new(BufReader::new(File::open(tarball)?));
        tar::Archive::new(decoder).unpack(dest)?;
        Ok(())
    }

    fn create_tarball(
        &self,
        tarball: &Path,
        base: &Path,
        dir_name: &str,
    ) -> Result<(), PatchError> {
        let encoder = GzEncoder::new(File::create(tarball)?, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(dir_name, base.join(dir_name))?;
        builder.into_inner()?.finish()?;
        Ok(())
    }
}
