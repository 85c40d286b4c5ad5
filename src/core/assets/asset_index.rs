use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::core::cancel::{CancelCheck, CancellationToken};
use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::fetch_json;
use crate::core::version::AssetIndexRef;

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// First two hex characters of the hash, used as the storage bucket.
    ///
    /// `None` unless the whole hash is hex, so it can never name a path
    /// outside `objects/`.
    pub fn prefix(&self) -> Option<&str> {
        if !self.hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        self.hash.get(..2)
    }
}

/// Counts reported back after an asset sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssetSyncReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Manages asset downloads (sounds, textures referenced by the asset index).
pub struct AssetManager<'a> {
    downloader: &'a Downloader,
    resource_base: &'a str,
}

impl<'a> AssetManager<'a> {
    pub fn new(downloader: &'a Downloader, resource_base: &'a str) -> Self {
        Self {
            downloader,
            resource_base: resource_base.trim_end_matches('/'),
        }
    }

    /// Download the asset index JSON and all referenced objects into
    /// `game_dir/assets`.
    ///
    /// A failing index fetch aborts the sync; failing objects are counted.
    pub async fn sync(
        &self,
        index_ref: &AssetIndexRef,
        game_dir: &Path,
        cancel: &CancellationToken,
    ) -> LauncherResult<AssetSyncReport> {
        cancel.check()?;
        let assets_dir = game_dir.join("assets");

        // 1. Asset index JSON
        let (index, raw): (AssetIndex, Vec<u8>) =
            fetch_json(self.downloader.fetcher(), &index_ref.url).await?;

        let indexes_dir = assets_dir.join("indexes");
        tokio::fs::create_dir_all(&indexes_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: indexes_dir.clone(),
                source: e,
            })?;
        let index_path = indexes_dir.join(format!("{}.json", index_ref.id));
        tokio::fs::write(&index_path, &raw)
            .await
            .map_err(|e| LauncherError::Io {
                path: index_path,
                source: e,
            })?;

        // 2. One entry per distinct object; names sharing a hash share the file
        let objects_dir = assets_dir.join("objects");
        let mut report = AssetSyncReport::default();
        let mut entries = Vec::with_capacity(index.objects.len());
        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(index.objects.len());
        let mut shared = 0;

        for (name, obj) in &index.objects {
            match self.object_entry(&objects_dir, obj) {
                Some(entry) if !seen.insert(entry.dest.clone()) => shared += 1,
                Some(entry) => entries.push(entry),
                None => {
                    let err = LauncherError::InvalidAssetHash {
                        name: name.clone(),
                        hash: obj.hash.clone(),
                    };
                    warn!("{}", err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Syncing {} asset objects for index {} ({} names share an object)",
            entries.len(),
            index_ref.id,
            shared
        );

        // 3. Download batch
        let batch = self.downloader.download_batch(entries, cancel).await;
        cancel.check()?;

        report.downloaded = batch.downloaded;
        report.skipped = batch.skipped + shared;
        report.failed += batch.failed();

        if report.failed > 0 {
            warn!("{} asset downloads failed", report.failed);
        }
        Ok(report)
    }

    fn object_entry(&self, objects_dir: &Path, obj: &AssetObject) -> Option<DownloadEntry> {
        let prefix = obj.prefix()?;
        Some(DownloadEntry {
            url: format!("{}/{}/{}", self.resource_base, prefix, obj.hash),
            dest: object_path(objects_dir, prefix, &obj.hash),
            sha1: Some(obj.hash.clone()),
        })
    }
}

fn object_path(objects_dir: &Path, prefix: &str, hash: &str) -> PathBuf {
    objects_dir.join(prefix).join(hash)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::http::testing::FakeFetcher;

    const INDEX_URL: &str = "https://example.com/indexes/5.json";

    fn temp_game_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("assets-test-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn index_ref() -> AssetIndexRef {
        AssetIndexRef {
            id: "5".into(),
            url: INDEX_URL.into(),
        }
    }

    fn serve(fetcher: &FakeFetcher, hashes: &[&str]) {
        let objects: serde_json::Map<String, serde_json::Value> = hashes
            .iter()
            .enumerate()
            .map(|(i, hash)| {
                (
                    format!("minecraft/sounds/{}.ogg", i),
                    serde_json::json!({"hash": hash, "size": 1}),
                )
            })
            .collect();
        fetcher.route_json(INDEX_URL, &serde_json::json!({ "objects": objects }));
        for hash in hashes {
            if let Some(prefix) = hash.get(..2) {
                fetcher.route(&format!("{}/{}/{}", RESOURCES_URL, prefix, hash), b"x".to_vec());
            }
        }
    }

    #[tokio::test]
    async fn fetches_only_missing_objects() {
        let game_dir = temp_game_dir("missing");
        let fetcher = Arc::new(FakeFetcher::new());
        let hashes = ["aa11", "bb22", "cc33", "dd44"];
        serve(&fetcher, &hashes);

        for present in ["aa11", "cc33"] {
            let path = game_dir
                .join("assets/objects")
                .join(&present[..2])
                .join(present);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"x").unwrap();
        }

        let downloader = Downloader::new(fetcher.clone());
        let report = AssetManager::new(&downloader, RESOURCES_URL)
            .sync(&index_ref(), &game_dir, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            report,
            AssetSyncReport {
                downloaded: 2,
                skipped: 2,
                failed: 0
            }
        );
        let object_fetches = fetcher
            .requests()
            .iter()
            .filter(|url| url.starts_with(RESOURCES_URL))
            .count();
        assert_eq!(object_fetches, 2);
        assert!(game_dir.join("assets/indexes/5.json").exists());
        assert!(game_dir.join("assets/objects/bb/bb22").exists());

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[tokio::test]
    async fn object_failures_are_counted_not_fatal() {
        let game_dir = temp_game_dir("failures");
        let fetcher = Arc::new(FakeFetcher::new());
        // "x" is too short to bucket, "ee55" is listed but never served
        fetcher.route_json(
            INDEX_URL,
            &serde_json::json!({"objects": {
                "ok": {"hash": "aa11", "size": 1},
                "short": {"hash": "x", "size": 1},
                "gone": {"hash": "ee55", "size": 1}
            }}),
        );
        fetcher.route(&format!("{}/aa/aa11", RESOURCES_URL), b"x".to_vec());

        let downloader = Downloader::new(fetcher.clone());
        let report = AssetManager::new(&downloader, RESOURCES_URL)
            .sync(&index_ref(), &game_dir, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed, 2);

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn names_sharing_a_hash_fetch_the_object_once() {
        let game_dir = temp_game_dir("shared");
        let fetcher = Arc::new(FakeFetcher::new());
        serve(&fetcher, &["aa11"; 16]);

        let downloader = Downloader::new(fetcher.clone());
        let report = AssetManager::new(&downloader, RESOURCES_URL)
            .sync(&index_ref(), &game_dir, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            report,
            AssetSyncReport {
                downloaded: 1,
                skipped: 15,
                failed: 0
            }
        );
        let object_fetches = fetcher
            .requests()
            .iter()
            .filter(|url| url.starts_with(RESOURCES_URL))
            .count();
        assert_eq!(object_fetches, 1);
        assert!(game_dir.join("assets/objects/aa/aa11").is_file());

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[test]
    fn non_hex_hashes_have_no_bucket() {
        let obj = |hash: &str| AssetObject {
            hash: hash.into(),
            size: 1,
        };
        assert_eq!(obj("aa11").prefix(), Some("aa"));
        assert_eq!(obj("../../etc").prefix(), None);
        assert_eq!(obj("aa/11").prefix(), None);
        assert_eq!(obj("x").prefix(), None);
    }

    #[tokio::test]
    async fn index_failure_aborts() {
        let game_dir = temp_game_dir("noindex");
        let fetcher = Arc::new(FakeFetcher::new());
        let downloader = Downloader::new(fetcher);

        let err = AssetManager::new(&downloader, RESOURCES_URL)
            .sync(&index_ref(), &game_dir, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::DownloadFailed { .. }));
    }
}
