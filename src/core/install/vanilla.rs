use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::assets::{AssetManager, AssetSyncReport};
use crate::core::cancel::CancelCheck;
use crate::core::downloader::{BatchReport, DownloadEntry, FetchOutcome};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::classpath::{client_jar_path, libraries_dir, version_dir};
use crate::core::version::{is_allowed, OsName, VersionDetails};

use super::context::InstallContext;

/// Result of materializing one version on disk.
#[derive(Debug)]
pub struct InstallReport {
    pub libraries: BatchReport,
    pub client_jar: PathBuf,
    /// `None` when a custom client jar is configured.
    pub client_outcome: Option<FetchOutcome>,
    pub assets: AssetSyncReport,
}

impl InstallReport {
    /// Library and asset failures combined; the client jar cannot fail here.
    pub fn failed(&self) -> usize {
        self.libraries.failed() + self.assets.failed
    }
}

/// Downloads the platform-allowed libraries, the client jar and the assets
/// of `ctx.details`, in that order.
///
/// Library and asset failures are counted; a failing client jar or asset
/// index aborts. Files already written stay on disk either way.
pub async fn install_version(ctx: InstallContext<'_>) -> LauncherResult<InstallReport> {
    let details = ctx.details;
    info!("Installing {} into {:?}", details.id, ctx.game_dir);
    ctx.cancel.check()?;

    // 1. Version JSON
    let version_dir = version_dir(ctx.game_dir, &details.id);
    VersionDetails::save_to(ctx.raw_json, &version_dir, &details.id).await?;

    // 2. Libraries
    let entries = library_entries(details, &libraries_dir(ctx.game_dir), ctx.os);
    let libraries = ctx.downloader.download_batch(entries, ctx.cancel).await;
    ctx.cancel.check()?;
    if libraries.failed() > 0 {
        warn!("{} library downloads failed", libraries.failed());
    }

    // 3. Client jar
    let (client_jar, client_outcome) = match ctx.client_jar_override {
        Some(path) => {
            info!("Using custom client jar {:?}", path);
            if !path.is_file() {
                return Err(LauncherError::Configuration(format!(
                    "Custom client jar not found at {:?}",
                    path
                )));
            }
            (path.to_path_buf(), None)
        }
        None => {
            let path = client_jar_path(ctx.game_dir, &details.id);
            let outcome = ctx
                .downloader
                .ensure_file(&details.client.url, &path, details.client.sha1.as_deref())
                .await?;
            debug!("Client jar {:?}: {:?}", path, outcome);
            (path, Some(outcome))
        }
    };
    ctx.cancel.check()?;

    // 4. Assets
    let assets = AssetManager::new(ctx.downloader, ctx.resource_base)
        .sync(&details.asset_index, ctx.game_dir, ctx.cancel)
        .await?;

    info!(
        "{} installed: {} libraries fetched, {} assets fetched, {} failures",
        details.id,
        libraries.downloaded,
        assets.downloaded,
        libraries.failed() + assets.failed
    );

    Ok(InstallReport {
        libraries,
        client_jar,
        client_outcome,
        assets,
    })
}

/// Download entries for every library that applies to `os` and has an artifact.
pub fn library_entries(details: &VersionDetails, libs_dir: &Path, os: OsName) -> Vec<DownloadEntry> {
    details
        .libraries
        .iter()
        .filter(|lib| {
            let allowed = is_allowed(lib, os);
            if !allowed {
                debug!("Skipping library (OS rule): {}", lib.name);
            }
            allowed
        })
        .filter_map(|lib| {
            let artifact = lib.artifact.as_ref()?;
            let Some(dest) = lib.local_path(libs_dir) else {
                warn!("Skipping library with unsafe path {:?}: {}", artifact.path, lib.name);
                return None;
            };
            Some(DownloadEntry {
                url: artifact.url.clone(),
                dest,
                sha1: artifact.sha1.clone(),
            })
        })
        .collect()
}
