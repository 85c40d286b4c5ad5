// ─── Version File ───
// Parses a Mojang version JSON into the parts the launcher needs.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{fetch_json, HttpFetch};

use super::rules::PlatformRule;

/// A selected version's metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetails {
    pub id: String,
    pub main_class: String,
    pub asset_index: AssetIndexRef,
    #[serde(rename = "downloads", deserialize_with = "client_from_downloads")]
    pub client: ClientArtifact,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Deserialize)]
struct VersionDownloads {
    client: ClientArtifact,
}

fn client_from_downloads<'de, D>(deserializer: D) -> Result<ClientArtifact, D::Error>
where
    D: serde::Deserializer<'de>,
{
    VersionDownloads::deserialize(deserializer).map(|downloads| downloads.client)
}

// ─── Library Entry ───

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "RawLibraryEntry")]
pub struct LibraryEntry {
    pub name: String,
    /// `None` for metadata-only entries (e.g. natives-only libraries).
    pub artifact: Option<LibraryArtifact>,
    pub rules: Vec<PlatformRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LibraryArtifact {
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Deserialize)]
struct RawLibraryEntry {
    name: String,
    #[serde(default)]
    downloads: Option<RawLibraryDownloads>,
    #[serde(default)]
    rules: Option<Vec<PlatformRule>>,
}

#[derive(Deserialize)]
struct RawLibraryDownloads {
    #[serde(default)]
    artifact: Option<LibraryArtifact>,
}

impl From<RawLibraryEntry> for LibraryEntry {
    fn from(raw: RawLibraryEntry) -> Self {
        Self {
            name: raw.name,
            artifact: raw.downloads.and_then(|d| d.artifact),
            rules: raw.rules.unwrap_or_default(),
        }
    }
}

impl LibraryEntry {
    /// Local path of the artifact under `libs_dir`, if the entry has one.
    ///
    /// Artifact paths that are empty, rooted or contain `..` give `None`.
    pub fn local_path(&self, libs_dir: &Path) -> Option<PathBuf> {
        let relative = Path::new(&self.artifact.as_ref()?.path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !contained || relative.as_os_str().is_empty() {
            return None;
        }
        Some(libs_dir.join(relative))
    }
}

impl VersionDetails {
    /// Fetch and parse a version JSON, returning the raw body alongside it.
    pub async fn fetch(fetcher: &dyn HttpFetch, url: &str) -> LauncherResult<(Self, Vec<u8>)> {
        let (details, raw): (VersionDetails, Vec<u8>) = fetch_json(fetcher, url).await?;
        info!(
            "Resolved version {} ({} libraries, asset index {})",
            details.id,
            details.libraries.len(),
            details.asset_index.id
        );
        Ok((details, raw))
    }

    /// Persist the raw version JSON next to the client jar.
    pub async fn save_to(raw_json: &[u8], version_dir: &Path, version_id: &str) -> LauncherResult<()> {
        tokio::fs::create_dir_all(version_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: version_dir.to_path_buf(),
                source,
            })?;
        let path = version_dir.join(format!("{}.json", version_id));
        tokio::fs::write(&path, raw_json)
            .await
            .map_err(|source| LauncherError::Io { path, source })?;
        Ok(())
    }
}
