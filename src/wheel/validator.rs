//! Wheel validation - verify RECORD entries against the bytes actually stored

use std::collections::HashSet;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

use zip::ZipArchive;

use crate::config::DigestEncoding;
use crate::error::PatchError;
use crate::error::ValidationError;
use crate::error::ValidationResult;
use crate::record::Record;
use crate::record::hash_content;
use crate::record::verify_digest;
use crate::wheel::WheelReader;

/// Validate the RECORD entries of `paths` against the archive contents
pub fn validate_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    record: &Record,
    paths: &[String],
) -> Result<ValidationResult, PatchError> {
    let mut result = ValidationResult::default();

    let archive_files: HashSet<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();

    for path in paths {
        let Some(entry) = record.find(path) else {
            result.errors.push(ValidationError::MissingEntry { path: path.clone() });
            continue;
        };

        if !archive_files.contains(path) {
            result.errors.push(ValidationError::MissingFile { path: path.clone() });
            continue;
        }

        let mut file = archive.by_name(path)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let matches = match entry.hash.as_deref() {
            Some(hash) => verify_digest(hash, &contents)?,
            None => false,
        };
        if !matches {
            result.errors.push(ValidationError::HashMismatch {
                path: path.clone(),
                expected: entry.hash.clone().unwrap_or_default(),
                actual: hash_content(&contents, DigestEncoding::Standard),
            });
            continue;
        }

        if entry.size != Some(contents.len() as u64) {
            result.errors.push(ValidationError::SizeMismatch {
                path: path.clone(),
                expected: entry.size,
                actual: contents.len() as u64,
            });
        }
    }

    Ok(result)
}

/// Check a patched wheel: every path in `replaced` must validate against RECORD.
///
/// Fails with the first mismatch as an integrity error.
pub fn verify_patched(wheel: &Path, replaced: &[String]) -> Result<(), PatchError> {
    let scan = WheelReader::open(wheel)?.scan()?;
    let record = Record::parse(&scan.record)?;

    let mut archive = ZipArchive::new(std::io::BufReader::new(std::fs::File::open(wheel)?))?;
    let result = validate_entries(&mut archive, &record, replaced)?;

    match result.errors.into_iter().next() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
