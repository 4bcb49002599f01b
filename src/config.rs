//! Fork configuration
//!
//! Every string the patchers rewrite lives here. The defaults describe the
//! `pythonmonkey` -> `pythonmonkey-fork` release, so running without a config
//! file reproduces the published fork.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::PatchError;
use crate::name::normalize_dist_info_name;

/// How `sha256=` digests are encoded in rewritten RECORD lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestEncoding {
    /// Standard alphabet with padding, as the published fork has always emitted
    #[default]
    Standard,
    /// URL-safe alphabet without padding (PEP 376)
    UrlSafeNoPad,
}

/// The one dependency the fork renames
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DependencyRename {
    /// Exact `Requires-Dist:` line in METADATA / PKG-INFO
    pub metadata_from: String,
    /// Replacement `Requires-Dist:` line
    pub metadata_to: String,
    /// Key of the dependency table entry in pyproject.toml
    pub pyproject_key: String,
    /// Full replacement line for that entry
    pub pyproject_line: String,
}

impl Default for DependencyRename {
    fn default() -> Self {
        Self {
            metadata_from: "Requires-Dist: pminit (>=0.4.0)".to_string(),
            metadata_to: "Requires-Dist: pythonmonkey-node-modules (~=0.1)".to_string(),
            pyproject_key: "pminit".to_string(),
            pyproject_line: "pythonmonkey_node_modules = \"~0.1\"".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForkConfig {
    /// Upstream package name as published
    pub package: String,
    /// Name the artifacts are republished under
    pub fork_package: String,
    pub dependency: DependencyRename,
    /// Paths inside the wheel that are replaced with fresh on-disk copies
    pub tracked_files: Vec<String>,
    /// Directory the tracked files are read from
    pub source_root: PathBuf,
    /// Directory inside an sdist's root that holds the tracked files
    pub sdist_source_dir: PathBuf,
    /// Simple index base, the listing is `<index_url>/<package>/`
    pub index_url: String,
    /// Nightly base, the listing is `<nightly_url>/<package>/`
    pub nightly_url: String,
    pub dist_dir: PathBuf,
    pub digest_encoding: DigestEncoding,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            package: "pythonmonkey".to_string(),
            fork_package: "pythonmonkey-fork".to_string(),
            dependency: DependencyRename::default(),
            tracked_files: vec![
                "pythonmonkey/require.py".to_string(),
                "pythonmonkey/__init__.py".to_string(),
            ],
            source_root: PathBuf::from("python"),
            sdist_source_dir: PathBuf::from("python"),
            index_url: "https://pypi.org/simple".to_string(),
            nightly_url: "https://nightly.pythonmonkey.io".to_string(),
            dist_dir: PathBuf::from("dist"),
            digest_encoding: DigestEncoding::Standard,
        }
    }
}

impl ForkConfig {
    /// Parse a config from TOML; missing keys keep their defaults
    pub fn parse(content: &str) -> Result<Self, PatchError> {
        let config: ForkConfig =
            toml::from_str(content).map_err(|e| PatchError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PatchError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    fn check(&self) -> Result<(), PatchError> {
        if self.package.is_empty() || self.fork_package.is_empty() {
            return Err(PatchError::Config(
                "package and fork_package must not be empty".to_string(),
            ));
        }
        if self.sdist_source_dir.is_absolute() {
            return Err(PatchError::Config(
                "sdist_source_dir must be relative".to_string(),
            ));
        }
        if self.tracked_files.is_empty() {
            return Err(PatchError::Config(
                "at least one tracked file is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Upstream name as it appears in dist-info directories and filenames
    pub fn dist_name(&self) -> String {
        normalize_dist_info_name(&self.package)
    }

    /// Fork name as it appears in dist-info directories and filenames
    /// (e.g. `pythonmonkey_fork`)
    pub fn fork_dist_name(&self) -> String {
        normalize_dist_info_name(&self.fork_package)
    }

    /// On-disk location of a tracked file
    pub fn tracked_source(&self, tracked: &str) -> PathBuf {
        self.source_root.join(tracked)
    }

    /// Read every tracked file fresh from disk, keyed by its path inside the archive
    pub fn read_tracked_sources(&self) -> Result<Vec<(String, Vec<u8>)>, PatchError> {
        let mut sources = Vec::with_capacity(self.tracked_files.len());
        for tracked in &self.tracked_files {
            let source = self.tracked_source(tracked);
            let bytes = std::fs::read(&source).map_err(|e| {
                PatchError::Config(format!("tracked file {}: {}", source.display(), e))
            })?;
            sources.push((tracked.clone(), bytes));
        }
        Ok(sources)
    }
}
