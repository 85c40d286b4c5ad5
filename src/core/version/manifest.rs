// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest.

use serde::Deserialize;
use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::http::{fetch_json, HttpFetch};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// How many versions the selection list shows by default.
pub const DEFAULT_RELEASE_LIMIT: usize = 20;

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    Release,
    Snapshot,
    #[serde(other)]
    Other,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VersionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    #[serde(rename = "url")]
    pub detail_url: String,
}

/// Presentation policy for the version list.
#[derive(Debug, Clone, Copy)]
pub struct VersionFilter {
    pub include_snapshots: bool,
    pub limit: Option<usize>,
}

impl Default for VersionFilter {
    fn default() -> Self {
        Self {
            include_snapshots: false,
            limit: Some(DEFAULT_RELEASE_LIMIT),
        }
    }
}

impl VersionFilter {
    pub fn all() -> Self {
        Self {
            include_snapshots: true,
            limit: None,
        }
    }

    fn accepts(&self, summary: &VersionSummary) -> bool {
        match summary.kind {
            VersionKind::Release => true,
            VersionKind::Snapshot | VersionKind::Other => self.include_snapshots,
        }
    }
}

impl VersionManifest {
    /// Fetch the version manifest. Never cached.
    pub async fn fetch(fetcher: &dyn HttpFetch, url: &str) -> LauncherResult<Self> {
        info!("Fetching version manifest from {}", url);
        let (manifest, _raw): (VersionManifest, Vec<u8>) = fetch_json(fetcher, url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionSummary> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Entries passing `filter`, in manifest order.
    pub fn filtered(&self, filter: VersionFilter) -> Vec<VersionSummary> {
        let matching = self.versions.iter().filter(|v| filter.accepts(v)).cloned();
        match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

/// Fetch the manifest and apply the selection-list policy.
pub async fn list_versions(
    fetcher: &dyn HttpFetch,
    url: &str,
    filter: VersionFilter,
) -> LauncherResult<Vec<VersionSummary>> {
    Ok(VersionManifest::fetch(fetcher, url).await?.filtered(filter))
}
