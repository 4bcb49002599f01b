//! Sdist patcher - republishes a source tarball under the fork name
//!
//! Sdists carry no RECORD, so there is no digest bookkeeping here: the tree is
//! unpacked, a handful of files are rewritten or replaced, and the renamed tree
//! is packed back over the original tarball.

use std::path::Path;

use tempfile::TempDir;
use tracing::debug;
use tracing::instrument;

use crate::archive::ArchiveTransformer;
use crate::config::ForkConfig;
use crate::error::PatchError;
use crate::metadata::rewrite_metadata;
use crate::name::fork_name;

/// Rewrite the package name and the renamed dependency in pyproject.toml.
///
/// Only the `name = "<package>"` declaration and lines starting with
/// `<pyproject_key> = ` are touched; everything else is kept as text. The
/// result always ends with a single newline.
pub fn rewrite_pyproject(content: &str, config: &ForkConfig) -> String {
    let renamed = content.replace(
        &format!("name = \"{}\"", config.package),
        &format!("name = \"{}\"", config.fork_package),
    );
    let dependency = format!("{} = ", config.dependency.pyproject_key);

    let mut output = renamed
        .lines()
        .map(|line| {
            if line.starts_with(&dependency) {
                config.dependency.pyproject_line.as_str()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    output.push('\n');
    output
}

/// Read a file the sdist root must contain; absence means a malformed sdist
fn read_root_file(sdist: &Path, file: &Path) -> Result<String, PatchError> {
    match std::fs::read_to_string(file) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Err(PatchError::malformed(sdist, format!("missing {}", name)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Patches sdists in place
pub struct SdistPatcher<'a> {
    config: &'a ForkConfig,
    archiver: &'a dyn ArchiveTransformer,
}

impl<'a> SdistPatcher<'a> {
    pub fn new(config: &'a ForkConfig, archiver: &'a dyn ArchiveTransformer) -> Self {
        Self { config, archiver }
    }

    /// Patch the `.tar.gz` at `path`, rewriting the file in place
    #[instrument(skip_all, fields(sdist = %path.display()))]
    pub fn patch(&self, path: &Path) -> Result<(), PatchError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root_name = file_name
            .strip_suffix(".tar.gz")
            .ok_or_else(|| PatchError::malformed(path, "not a .tar.gz file"))?
            .to_string();

        let scratch = TempDir::new()?;
        self.archiver.extract_tarball(path, scratch.path())?;

        let root = scratch.path().join(&root_name);
        if !root.is_dir() {
            return Err(PatchError::malformed(
                path,
                format!("missing top-level directory {}", root_name),
            ));
        }

        let pyproject = root.join("pyproject.toml");
        let content = read_root_file(path, &pyproject)?;
        std::fs::write(&pyproject, rewrite_pyproject(&content, self.config))?;

        let pkg_info = root.join("PKG-INFO");
        let content = read_root_file(path, &pkg_info)?;
        std::fs::write(&pkg_info, rewrite_metadata(&content, self.config))?;

        for (tracked, bytes) in self.config.read_tracked_sources()? {
            let target = root.join(&self.config.sdist_source_dir).join(&tracked);
            debug!("injecting {}", target.display());
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, bytes)?;
        }

        let new_name = fork_name(
            &root_name,
            &self.config.dist_name(),
            &self.config.fork_dist_name(),
        );
        debug!("renaming {} to {}", root_name, new_name);
        std::fs::rename(&root, scratch.path().join(&new_name))?;

        self.archiver.create_tarball(path, scratch.path(), &new_name)?;
        Ok(())
    }
}
