//! Fetch/dispatch driver
//!
//! Resolves which artifacts belong to a release (or the nightly channel),
//! downloads them concurrently, patches each one on a blocking worker and
//! renames the result to the fork filename. The first failure aborts the run;
//! artifacts that already finished stay in the dist directory.

use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::LazyLock;

use futures::future::try_join_all;
use regex::Regex;
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::archive::ArchiveTransformer;
use crate::config::ForkConfig;
use crate::error::PatchError;
use crate::name::fork_name;
use crate::sdist::SdistPatcher;
use crate::wheel::WheelPatcher;

/// Accept header of the PEP 691 JSON simple API
pub const SIMPLE_JSON: &str = "application/vnd.pypi.simple.v1+json";

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid regex"));

/// Which artifacts to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Every file of the given version on the package index
    Release(String),
    /// Everything on the nightly listing
    Nightly,
}

impl Channel {
    pub fn parse(token: &str) -> Self {
        if token == "nightly" {
            Channel::Nightly
        } else {
            Channel::Release(token.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Wheel,
    Sdist,
    Other,
}

impl ArtifactKind {
    pub fn from_filename(filename: &str) -> Self {
        if filename.ends_with(".whl") {
            ArtifactKind::Wheel
        } else if filename.ends_with(".tar.gz") {
            ArtifactKind::Sdist
        } else {
            ArtifactKind::Other
        }
    }
}

/// A file on a listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SimpleIndex {
    files: Vec<Artifact>,
}

/// Outcome of one artifact
#[derive(Debug, Clone)]
pub struct PatchedArtifact {
    pub kind: ArtifactKind,
    /// Filename as published upstream
    pub original: String,
    /// Final location under the dist directory
    pub path: PathBuf,
}

/// Extract artifacts from an HTML directory listing.
///
/// Hrefs are resolved against the listing URL; the last path segment is the
/// filename. Links to directories (including `../`) are skipped, and a file
/// linked more than once is kept at its first occurrence.
pub fn parse_nightly_listing(html: &str, listing: &Url) -> Result<Vec<Artifact>, PatchError> {
    let mut artifacts = Vec::new();
    let mut seen = HashSet::new();
    for captures in HREF.captures_iter(html) {
        let url = listing.join(&captures[1])?;
        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .to_string();
        if filename.is_empty() {
            debug!("skipping {}", url);
            continue;
        }
        if !seen.insert(filename.clone()) {
            continue;
        }
        artifacts.push(Artifact {
            filename,
            url: url.to_string(),
        });
    }
    Ok(artifacts)
}

/// Keep the index files of `<package>-<version>`
pub fn filter_release(files: Vec<Artifact>, package: &str, version: &str) -> Vec<Artifact> {
    let prefix = format!("{}-{}", package, version);
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|file| file.filename.starts_with(&prefix))
        .filter(|file| seen.insert(file.filename.clone()))
        .collect()
}

/// Resolve where `filename` lands in `dist`.
///
/// Only a single plain path component is accepted, so a listing cannot place
/// files outside the dist directory.
pub fn dist_path(dist: &Path, filename: &str) -> Result<PathBuf, PatchError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename => Ok(dist.join(name)),
        _ => Err(PatchError::malformed(
            filename,
            "listed filename is not a plain file name",
        )),
    }
}

/// Runs one fetch-patch-rename pass. Holds the HTTP client for the run.
pub struct Driver {
    client: Client,
    config: Arc<ForkConfig>,
    archiver: Arc<dyn ArchiveTransformer>,
}

impl Driver {
    pub fn new(
        config: Arc<ForkConfig>,
        archiver: Arc<dyn ArchiveTransformer>,
    ) -> Result<Self, PatchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(SIMPLE_JSON));
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            config,
            archiver,
        })
    }

    fn listing_url(&self, base: &str) -> Result<Url, PatchError> {
        Ok(Url::parse(&format!(
            "{}/{}/",
            base.trim_end_matches('/'),
            self.config.package
        ))?)
    }

    /// Find the artifacts of a channel
    pub async fn resolve(&self, channel: &Channel) -> Result<Vec<Artifact>, PatchError> {
        match channel {
            Channel::Release(version) => {
                let url = self.listing_url(&self.config.index_url)?;
                debug!("querying {}", url);
                let body = self
                    .client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                let index: SimpleIndex = serde_json::from_str(&body)?;
                Ok(filter_release(index.files, &self.config.package, version))
            }
            Channel::Nightly => {
                let url = self.listing_url(&self.config.nightly_url)?;
                debug!("querying {}", url);
                let html = self
                    .client
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                parse_nightly_listing(&html, &url)
            }
        }
    }

    async fn download(&self, artifact: &Artifact, dist: &Path) -> Result<PathBuf, PatchError> {
        let path = dist_path(dist, &artifact.filename)?;
        debug!("downloading {}", artifact.url);
        let bytes = self
            .client
            .get(&artifact.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }

    /// Resolve, download, patch and rename every artifact of `channel`
    pub async fn run(&self, channel: &Channel) -> Result<Vec<PatchedArtifact>, PatchError> {
        let dist = self.config.dist_dir.clone();
        tokio::fs::create_dir_all(&dist).await?;

        let artifacts = self.resolve(channel).await?;
        if artifacts.is_empty() {
            warn!("no artifacts found for {:?}", channel);
            return Ok(Vec::new());
        }
        info!("found {} artifacts", artifacts.len());

        let paths = try_join_all(artifacts.iter().map(|a| self.download(a, &dist))).await?;

        let units = artifacts.into_iter().zip(paths).map(|(artifact, path)| {
            let config = Arc::clone(&self.config);
            let archiver = Arc::clone(&self.archiver);
            let dist = dist.clone();
            tokio::task::spawn_blocking(move || {
                patch_artifact(&config, archiver.as_ref(), &artifact.filename, &path, &dist)
            })
        });

        let results = try_join_all(units).await?;
        results.into_iter().collect()
    }
}

/// Patch one downloaded artifact and move it to its fork filename
pub fn patch_artifact(
    config: &ForkConfig,
    archiver: &dyn ArchiveTransformer,
    filename: &str,
    path: &Path,
    dist: &Path,
) -> Result<PatchedArtifact, PatchError> {
    let kind = ArtifactKind::from_filename(filename);
    match kind {
        ArtifactKind::Wheel => WheelPatcher::new(config, archiver).patch(path)?,
        ArtifactKind::Sdist => SdistPatcher::new(config, archiver).patch(path)?,
        ArtifactKind::Other => debug!("{} is left as is", filename),
    }

    let renamed = dist.join(fork_name(
        filename,
        &config.dist_name(),
        &config.fork_dist_name(),
    ));
    std::fs::rename(path, &renamed)?;
    info!("Patched {}", filename);

    Ok(PatchedArtifact {
        kind,
        original: filename.to_string(),
        path: renamed,
    })
}
