//! Textual rewrite of core metadata (PEP 566) for the fork
//!
//! The rewrite is deliberately line-agnostic: only the name declaration, the
//! renamed dependency and local versions change, everything else (including the
//! long description body) is preserved byte for byte.

use tracing::debug;

use crate::config::ForkConfig;
use crate::name::strip_local_version;

/// Rewrite METADATA or PKG-INFO text for the fork.
///
/// Replaces the first `Name: <package>` with `Name: <fork_package>`, swaps the
/// configured `Requires-Dist:` line and strips local version suffixes. Text
/// without the name declaration passes through with only the other two edits.
pub fn rewrite_metadata(content: &str, config: &ForkConfig) -> String {
    let original = format!("Name: {}", config.package);
    let forked = format!("Name: {}", config.fork_package);

    if !content.contains(&original) {
        debug!("no `{}` declaration found, name left unchanged", original);
    }

    let renamed = content.replacen(&original, &forked, 1).replace(
        &config.dependency.metadata_from,
        &config.dependency.metadata_to,
    );
    strip_local_version(&renamed)
}
