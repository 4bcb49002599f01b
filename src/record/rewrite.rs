//! Line-level RECORD rewriting for replaced files

use crate::config::ForkConfig;
use crate::name::strip_local_version;
use crate::record::hash_content;

/// Rewrite RECORD text after files inside the wheel were replaced.
///
/// Every line whose path field exactly matches one of `replaced` gets a fresh
/// digest and size computed from the replacement bytes. All other lines are
/// kept verbatim. Afterwards `<dist_name>-` is renamed to `<fork_dist_name>-`
/// throughout (which moves the dist-info entries) and local versions are
/// stripped.
pub fn rewrite_record(
    content: &str,
    replaced: &[(String, Vec<u8>)],
    config: &ForkConfig,
) -> String {
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let path = line.split(',').next().unwrap_or(line);
            match replaced.iter().find(|(p, _)| p == path) {
                Some((path, bytes)) if line.contains(',') => format!(
                    "{},{},{}",
                    path,
                    hash_content(bytes, config.digest_encoding),
                    bytes.len()
                ),
                _ => line.to_string(),
            }
        })
        .collect();

    let renamed = lines.join("\n").replace(
        &format!("{}-", config.dist_name()),
        &format!("{}-", config.fork_dist_name()),
    );
    strip_local_version(&renamed)
}
