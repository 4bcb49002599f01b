//! Wheel reader - locates and reads the dist-info files of a wheel

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use std::path::PathBuf;

use zip::ZipArchive;

use crate::error::PatchError;

/// Everything the patcher needs to know about a wheel, read in one pass
#[derive(Debug, Clone)]
pub struct WheelScan {
    /// e.g. "pkg-1.0.0.dist-info"
    pub dist_info_prefix: String,
    pub metadata_path: String,
    pub metadata: String,
    pub record_path: String,
    pub record: String,
    /// Every archive entry below the dist-info directory
    pub dist_info_entries: Vec<String>,
}

/// Reader for Python wheel files
pub struct WheelReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    path: PathBuf,
    dist_info_prefix: String,
}

impl WheelReader<BufReader<File>> {
    /// Open a wheel file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::new(BufReader::new(file), path)
    }
}

impl<R: Read + Seek> WheelReader<R> {
    /// Create a new wheel reader; `path` is only used in error messages
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Result<Self, PatchError> {
        let path = path.into();
        let archive = ZipArchive::new(reader)?;
        let dist_info_prefix = Self::find_dist_info_prefix(&archive, &path)?;

        Ok(Self {
            archive,
            path,
            dist_info_prefix,
        })
    }

    /// Find the single top-level .dist-info directory
    fn find_dist_info_prefix<T: Read + Seek>(
        archive: &ZipArchive<T>,
        path: &Path,
    ) -> Result<String, PatchError> {
        let mut prefixes: Vec<String> = Vec::new();
        for name in archive.file_names() {
            let top = name.split('/').next().unwrap_or(name);
            if top.ends_with(".dist-info")
                && name.len() > top.len()
                && !prefixes.iter().any(|p| p == top)
            {
                prefixes.push(top.to_string());
            }
        }

        match prefixes.len() {
            1 => Ok(prefixes.remove(0)),
            0 => Err(PatchError::malformed(path, "no .dist-info directory found")),
            _ => Err(PatchError::malformed(
                path,
                format!("multiple .dist-info directories: {}", prefixes.join(", ")),
            )),
        }
    }

    fn read_to_string(&mut self, entry: &str) -> Result<String, PatchError> {
        let mut file = self.archive.by_name(entry).map_err(|_| {
            PatchError::malformed(&self.path, format!("missing {}", entry))
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Read METADATA and RECORD and list the dist-info entries.
    ///
    /// Each of METADATA and RECORD must exist exactly once in the whole
    /// archive, inside the dist-info directory.
    pub fn scan(mut self) -> Result<WheelScan, PatchError> {
        for file_name in ["METADATA", "RECORD"] {
            let suffix = format!(".dist-info/{}", file_name);
            let count = self
                .archive
                .file_names()
                .filter(|name| name.ends_with(&suffix))
                .count();
            if count != 1 {
                return Err(PatchError::malformed(
                    &self.path,
                    format!("expected exactly one {}, found {}", file_name, count),
                ));
            }
        }

        let metadata_path = format!("{}/METADATA", self.dist_info_prefix);
        let record_path = format!("{}/RECORD", self.dist_info_prefix);
        let metadata = self.read_to_string(&metadata_path)?;
        let record = self.read_to_string(&record_path)?;

        let dir = format!("{}/", self.dist_info_prefix);
        let mut dist_info_entries: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| name.starts_with(&dir))
            .map(str::to_string)
            .collect();
        dist_info_entries.sort();

        Ok(WheelScan {
            dist_info_prefix: self.dist_info_prefix,
            metadata_path,
            metadata,
            record_path,
            record,
            dist_info_entries,
        })
    }
}
