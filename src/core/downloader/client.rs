use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::cancel::CancellationToken;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::HttpFetch;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
}

/// What `ensure_file` did for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched,
    Skipped,
}

/// Aggregate result of a batch. Failures are collected, never raised.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failures: Vec<(DownloadEntry, LauncherError)>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Idempotent, bounded-concurrency downloader.
pub struct Downloader {
    fetcher: Arc<dyn HttpFetch>,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    /// Off by default: presence alone counts as installed.
    verify_checksums: bool,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
            verify_checksums: false,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn fetcher(&self) -> &dyn HttpFetch {
        self.fetcher.as_ref()
    }

    // ── Single file download ────────────────────────────

    /// Make sure `dest` exists, fetching `url` only if it does not.
    ///
    /// Parent directories are created as needed. The body is written to a
    /// sibling `.part` file unique to this call and renamed, so a path that
    /// exists is complete.
    pub async fn ensure_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<FetchOutcome> {
        let exists = tokio::fs::try_exists(dest)
            .await
            .map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;

        if exists {
            let corrupt = match (self.verify_checksums, sha1_expected) {
                (true, Some(expected)) => !Self::validate_sha1(dest, expected).await?,
                _ => false,
            };
            if !corrupt {
                return Ok(FetchOutcome::Skipped);
            }
            warn!("Checksum mismatch on disk, re-downloading {:?}", dest);
        }

        let bytes = self.fetcher.fetch_bytes(url).await?;

        if self.verify_checksums {
            if let Some(expected) = sha1_expected {
                let actual = sha1_hex(&bytes);
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(LauncherError::Sha1Mismatch {
                        path: dest.to_path_buf(),
                        expected: expected.to_string(),
                        actual,
                    });
                }
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                }
            })?;
        }

        let partial = partial_path(dest);
        {
            let mut file =
                tokio::fs::File::create(&partial).await.map_err(|e| LauncherError::Io {
                    path: partial.clone(),
                    source: e,
                })?;
            file.write_all(&bytes).await.map_err(|e| LauncherError::Io {
                path: partial.clone(),
                source: e,
            })?;
            file.flush().await.map_err(|e| LauncherError::Io {
                path: partial.clone(),
                source: e,
            })?;
            // handle must be closed before the rename on Windows
        }
        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(FetchOutcome::Fetched)
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Ensure many files concurrently using `buffer_unordered`.
    ///
    /// Entries sharing a destination are fetched once; the repeats count as
    /// skipped. Entries not yet started when `cancel` fires are counted as
    /// cancelled.
    pub async fn download_batch(
        &self,
        entries: Vec<DownloadEntry>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let (entries, duplicates) = dedupe_by_dest(entries);
        info!(
            "Starting batch download: {} files, concurrency={}",
            entries.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(entries)
            .map(|entry| async move {
                if cancel.is_cancelled() {
                    return (entry, Err(LauncherError::Cancelled));
                }
                let result = self
                    .ensure_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport {
            skipped: duplicates,
            ..BatchReport::default()
        };
        for (entry, result) in results {
            match result {
                Ok(FetchOutcome::Fetched) => report.downloaded += 1,
                Ok(FetchOutcome::Skipped) => report.skipped += 1,
                Err(LauncherError::Cancelled) => report.cancelled += 1,
                Err(e) => {
                    warn!("Download failed for {}: {}", entry.url, e);
                    report.failures.push((entry, e));
                }
            }
        }

        info!(
            "Batch finished: {} downloaded, {} already present, {} failed, {} cancelled",
            report.downloaded,
            report.skipped,
            report.failed(),
            report.cancelled
        );
        report
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = tokio::fs::read(path).await.map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Keeps the first entry for every destination.
fn dedupe_by_dest(entries: Vec<DownloadEntry>) -> (Vec<DownloadEntry>, usize) {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut duplicates = 0;
    let unique = entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.dest.clone());
            if !first {
                duplicates += 1;
            }
            first
        })
        .collect();
    (unique, duplicates)
}

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// `{dest}.{pid}-{seq}.part`, distinct for every call in this process.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    name.push(format!(".{}-{}.part", std::process::id(), seq));
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::testing::FakeFetcher;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("downloader-test-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn ensure_file_fetches_once() {
        let dir = temp_dir("once");
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/a.jar", b"jar".to_vec());
        let downloader = Downloader::new(fetcher.clone());

        let dest = dir.join("nested/deeper/a.jar");
        let first = downloader
            .ensure_file("https://example.com/a.jar", &dest, None)
            .await
            .unwrap();
        let second = downloader
            .ensure_file("https://example.com/a.jar", &dest, None)
            .await
            .unwrap();

        assert_eq!(first, FetchOutcome::Fetched);
        assert_eq!(second, FetchOutcome::Skipped);
        assert_eq!(fetcher.request_count(), 1);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar");
        let leftovers = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_nothing_behind() {
        let dir = temp_dir("missing");
        let fetcher = Arc::new(FakeFetcher::new());
        let downloader = Downloader::new(fetcher);

        let dest = dir.join("missing.jar");
        let err = downloader
            .ensure_file("https://example.com/missing.jar", &dest, None)
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::DownloadFailed { status: 404, .. }));
        assert!(!dest.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn checksums_are_ignored_unless_enabled() {
        let dir = temp_dir("nochecksum");
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/a.jar", b"jar".to_vec());
        let downloader = Downloader::new(fetcher);

        let dest = dir.join("a.jar");
        let outcome = downloader
            .ensure_file("https://example.com/a.jar", &dest, Some("0000"))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Fetched);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn enabled_checksums_reject_bad_bodies_and_refetch_corrupt_files() {
        let dir = temp_dir("checksum");
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/a.jar", b"jar".to_vec());
        let downloader = Downloader::new(fetcher.clone()).with_checksums(true);
        let good = sha1_hex(b"jar");

        let dest = dir.join("a.jar");
        let err = downloader
            .ensure_file("https://example.com/a.jar", &dest, Some("0000"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Sha1Mismatch { .. }));
        assert!(!dest.exists());

        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&dest, b"corrupt").unwrap();
        let outcome = downloader
            .ensure_file("https://example.com/a.jar", &dest, Some(&good))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Fetched);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar");

        let outcome = downloader
            .ensure_file("https://example.com/a.jar", &dest, Some(&good))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Skipped);
        assert_eq!(fetcher.request_count(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn batch_counts_partial_failures() {
        let dir = temp_dir("batch");
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/a", b"a".to_vec());
        fetcher.route("https://example.com/b", b"b".to_vec());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b"), b"b").unwrap();

        let entries = ["a", "b", "c"]
            .iter()
            .map(|name| DownloadEntry {
                url: format!("https://example.com/{}", name),
                dest: dir.join(name),
                sha1: None,
            })
            .collect();

        let report = Downloader::new(fetcher.clone())
            .with_concurrency(2)
            .download_batch(entries, &CancellationToken::new())
            .await;

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].0.url, "https://example.com/c");
        assert_eq!(fetcher.request_count(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn batch_fetches_a_shared_destination_once() {
        let dir = temp_dir("shared");
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/obj", b"obj".to_vec());

        let entries = (0..16)
            .map(|_| DownloadEntry {
                url: "https://example.com/obj".into(),
                dest: dir.join("aa/aa11"),
                sha1: None,
            })
            .collect();
        let report = Downloader::new(fetcher.clone())
            .download_batch(entries, &CancellationToken::new())
            .await;

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.skipped, 15);
        assert_eq!(report.failed(), 0);
        assert_eq!(fetcher.request_count(), 1);
        assert_eq!(std::fs::read(dir.join("aa/aa11")).unwrap(), b"obj");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_paths_differ_per_call() {
        let dest = Path::new("/games/mc/assets/objects/aa/aa11");
        let first = partial_path(dest);
        let second = partial_path(dest);
        assert_ne!(first, second);
        assert_eq!(first.parent(), dest.parent());
        assert!(first.to_string_lossy().ends_with(".part"));
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_io_error() {
        let dir = temp_dir("blocked");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route("https://example.com/a.jar", b"jar".to_vec());
        let err = Downloader::new(fetcher)
            .ensure_file("https://example.com/a.jar", &blocker.join("a.jar"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Io { .. }));
        assert_eq!(err.category(), crate::core::error::ErrorCategory::Io);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn cancelled_batch_starts_nothing() {
        let dir = temp_dir("cancel");
        let fetcher = Arc::new(FakeFetcher::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let entries = vec![DownloadEntry {
            url: "https://example.com/a".into(),
            dest: dir.join("a"),
            sha1: None,
        }];
        let report = Downloader::new(fetcher.clone())
            .download_batch(entries, &cancel)
            .await;

        assert_eq!(report.cancelled, 1);
        assert_eq!(fetcher.request_count(), 0);
    }
}
