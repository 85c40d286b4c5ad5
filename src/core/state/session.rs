use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::core::auth::OfflineIdentity;
use crate::core::cancel::CancellationToken;
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{build_http_client, HttpFetch, ReqwestFetcher};
use crate::core::install::{install_version, InstallContext, InstallReport};
use crate::core::launch::{
    self, build_classpath, LaunchHandle, LaunchRequest, ResolvedFileSet, ServerTarget,
};
use crate::core::version::{
    list_versions, OsName, VersionDetails, VersionFilter, VersionManifest, VersionSummary,
};

use super::settings::{absolute_path, LauncherSettings};

struct Selection {
    details: VersionDetails,
    raw_json: Vec<u8>,
}

/// One user's launcher session: settings, transport and the currently
/// selected version. Each pipeline stage reads from here instead of from
/// global state.
pub struct Session {
    settings: LauncherSettings,
    game_dir: PathBuf,
    os: OsName,
    downloader: Downloader,
    selection: Option<Selection>,
}

impl Session {
    /// Session backed by a real HTTP client built from `settings`.
    pub fn new(settings: LauncherSettings) -> LauncherResult<Self> {
        let client = build_http_client(settings.request_timeout(), settings.connect_timeout())?;
        Self::with_fetcher(settings, Arc::new(ReqwestFetcher::new(client)))
    }

    /// Relative `game_dir` and client jar paths are resolved here, once, so
    /// every path handed to the game process is absolute.
    pub fn with_fetcher(mut settings: LauncherSettings, fetcher: Arc<dyn HttpFetch>) -> LauncherResult<Self> {
        let game_dir = absolute_path(&settings.game_dir)?;
        if let Some(jar) = settings.custom_client_jar.take() {
            settings.custom_client_jar = Some(absolute_path(&jar)?);
        }
        let downloader = Downloader::new(fetcher)
            .with_concurrency(settings.concurrency)
            .with_checksums(settings.verify_checksums);

        Ok(Self {
            settings,
            game_dir,
            os: OsName::current(),
            downloader,
            selection: None,
        })
    }

    /// Evaluate platform rules as if running on `os`.
    pub fn with_os(mut self, os: OsName) -> Self {
        self.os = os;
        self
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub async fn list_versions(&self, filter: VersionFilter) -> LauncherResult<Vec<VersionSummary>> {
        list_versions(self.downloader.fetcher(), &self.settings.manifest_url, filter).await
    }

    /// Resolve `version_id` and make it the current selection.
    ///
    /// On failure the previous selection is kept.
    pub async fn select_version(&mut self, version_id: &str) -> LauncherResult<&VersionDetails> {
        let manifest =
            VersionManifest::fetch(self.downloader.fetcher(), &self.settings.manifest_url).await?;
        let summary = manifest
            .find_version(version_id)
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))?;

        let (details, raw_json) =
            VersionDetails::fetch(self.downloader.fetcher(), &summary.detail_url).await?;
        info!("Selected version {}", details.id);

        let selection = self.selection.insert(Selection { details, raw_json });
        Ok(&selection.details)
    }

    pub fn selection(&self) -> Option<&VersionDetails> {
        self.selection.as_ref().map(|s| &s.details)
    }

    fn selected(&self) -> LauncherResult<&Selection> {
        self.selection.as_ref().ok_or(LauncherError::NoSelection)
    }

    fn client_jar_override(&self) -> Option<&Path> {
        self.settings.custom_client_jar.as_deref()
    }

    /// Materialize libraries, client jar and assets for the selection.
    pub async fn install(&self, cancel: &CancellationToken) -> LauncherResult<InstallReport> {
        let selection = self.selected()?;
        install_version(InstallContext {
            details: &selection.details,
            raw_json: &selection.raw_json,
            game_dir: &self.game_dir,
            downloader: &self.downloader,
            resource_base: &self.settings.resource_base_url,
            os: self.os,
            client_jar_override: self.client_jar_override(),
            cancel,
        })
        .await
    }

    pub fn resolve_file_set(&self) -> LauncherResult<ResolvedFileSet> {
        let selection = self.selected()?;
        build_classpath(
            &selection.details,
            &self.game_dir,
            self.os,
            self.client_jar_override(),
        )
    }

    /// Details resolved and the client jar present on disk.
    pub fn is_launchable(&self) -> bool {
        self.resolve_file_set().is_ok()
    }

    pub fn launch_request(
        &self,
        identity: OfflineIdentity,
        server: Option<ServerTarget>,
    ) -> LauncherResult<LaunchRequest> {
        if identity.is_blank() {
            return Err(LauncherError::Configuration("Enter a username!".into()));
        }
        let details = &self.selected()?.details;
        let files = self.resolve_file_set()?;

        Ok(LaunchRequest {
            java_path: self.settings.java_path.clone(),
            jvm_args: self.settings.jvm_args.clone(),
            classpath: files.joined(),
            main_class: details.main_class.clone(),
            version_id: details.id.clone(),
            game_dir: self.game_dir.clone(),
            asset_index_id: details.asset_index.id.clone(),
            identity,
            server,
        })
    }

    pub fn launch(
        &self,
        identity: OfflineIdentity,
        server: Option<ServerTarget>,
    ) -> LauncherResult<LaunchHandle> {
        let request = self.launch_request(identity, server)?;
        launch::launch(&request)
    }
}
