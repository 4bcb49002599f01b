//! Name rewriting for forked artifacts (PEP 427 naming, local versions)

use std::sync::LazyLock;

use regex::Regex;

static LOCAL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+\.dev\d+)\+\w+").expect("valid regex"));

/// Normalize a package name for use in dist-info directory names.
///
/// While PEP 503 normalizes to hyphens for PyPI URLs, dist-info directories
/// inside wheels use underscores as separators per PEP 427.
pub fn normalize_dist_info_name(name: &str) -> String {
    // Replace runs of [-_.] with underscore for dist-info dirs
    let mut result = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.chars() {
        if c == '-' || c == '_' || c == '.' {
            if !in_separator {
                result.push('_');
                in_separator = true;
            }
        } else {
            result.push(c);
            in_separator = false;
        }
    }

    result
}

/// Strip local version suffixes, which package indexes refuse.
///
/// `1.2.3.dev4+abcdef` becomes `1.2.3.dev4`. Only dev versions carry a local
/// suffix in practice, so other versions are left alone.
pub fn strip_local_version(text: &str) -> String {
    LOCAL_VERSION.replace_all(text, "$1").into_owned()
}

/// Substitute the forked name for a leading `<package>-` and strip the local
/// version. Used for dist-info directories, sdist roots and artifact filenames.
///
/// `pkg-1.2.3.dev4+abcdef.dist-info` becomes `pkg_fork-1.2.3.dev4.dist-info`.
pub fn fork_name(name: &str, package: &str, fork_dist_name: &str) -> String {
    let renamed = match name.strip_prefix(package).and_then(|rest| rest.strip_prefix('-')) {
        Some(rest) => format!("{}-{}", fork_dist_name, rest),
        None => name.to_string(),
    };
    strip_local_version(&renamed)
}
