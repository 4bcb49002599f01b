//! Archive transformer that shells out to `zip`, `unzip` and `tar`

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;
use tracing::debug;

use super::ArchiveTransformer;
use crate::error::PatchError;

/// Run a program to completion in `cwd`.
///
/// A non-zero exit fails with the full command line and exit code. A process
/// killed by a signal reports code -1.
pub fn run_command(program: &str, args: &[OsString], cwd: &Path) -> Result<(), PatchError> {
    let command = std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");
    debug!(cwd = %cwd.display(), "running {}", command);

    let status = Command::new(program).args(args).current_dir(cwd).status()?;
    if !status.success() {
        return Err(PatchError::Command {
            command,
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Archive transformer backed by external archive tools
#[derive(Debug, Clone)]
pub struct CommandArchiver {
    pub zip: String,
    pub unzip: String,
    pub tar: String,
}

impl Default for CommandArchiver {
    fn default() -> Self {
        Self {
            zip: "zip".to_string(),
            unzip: "unzip".to_string(),
            tar: "tar".to_string(),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, PatchError> {
    Ok(std::path::absolute(path)?)
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

impl ArchiveTransformer for CommandArchiver {
    fn replace_entry(
        &self,
        archive: &Path,
        entry: &str,
        contents: &[u8],
    ) -> Result<(), PatchError> {
        let scratch = TempDir::new()?;
        let staged = scratch.path().join(entry);
        if let Some(parent) = staged.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&staged, contents)?;

        // -f only freshens existing entries, so a missing entry fails with code 12
        let mut command = args(["-q", "-f"]);
        command.push(absolute(archive)?.into());
        command.push(entry.into());
        run_command(&self.zip, &command, scratch.path())
    }

    fn extract_entries(
        &self,
        archive: &Path,
        entries: &[String],
        dest: &Path,
    ) -> Result<(), PatchError> {
        let mut command = args(["-q"]);
        command.push(absolute(archive)?.into());
        command.extend(args(entries.iter().map(String::as_str)));
        command.push("-d".into());
        command.push(absolute(dest)?.into());
        run_command(&self.unzip, &command, dest)
    }

    fn delete_entries(&self, archive: &Path, entries: &[String]) -> Result<(), PatchError> {
        let mut command = args(["-q", "-d"]);
        let archive = absolute(archive)?;
        command.push(archive.clone().into());
        command.extend(args(entries.iter().map(String::as_str)));
        let cwd = archive.parent().unwrap_or_else(|| Path::new("."));
        run_command(&self.zip, &command, cwd)
    }

    fn add_tree(&self, archive: &Path, base: &Path, dir_name: &str) -> Result<(), PatchError> {
        let mut command = args(["-q", "-r"]);
        command.push(absolute(archive)?.into());
        command.push(dir_name.into());
        run_command(&self.zip, &command, base)
    }

    fn extract_tarball(&self, tarball: &Path, dest: &Path) -> Result<(), PatchError> {
        let mut command = args(["-xzf"]);
        command.push(absolute(tarball)?.into());
        run_command(&self.tar, &command, dest)
    }

    fn create_tarball(
        &self,
        tarball: &Path,
        base: &Path,
        dir_name: &str,
    ) -> Result<(), PatchError> {
        let mut command = args(["-czf"]);
        command.push(absolute(tarball)?.into());
        command.push(dir_name.into());
        run_command(&self.tar, &command, base)
    }
}
