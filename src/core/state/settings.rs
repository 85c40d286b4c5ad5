use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::assets::RESOURCES_URL;
use crate::core::downloader::DEFAULT_CONCURRENCY;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::manifest::{DEFAULT_RELEASE_LIMIT, VERSION_MANIFEST_URL};

const APP_DIR_NAME: &str = "InstantMC";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// Persistent launcher settings, stored as JSON in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherSettings {
    pub game_dir: PathBuf,
    pub java_path: PathBuf,
    /// Client jar used instead of `versions/{id}/{id}.jar`.
    pub custom_client_jar: Option<PathBuf>,
    pub manifest_url: String,
    pub resource_base_url: String,
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub verify_checksums: bool,
    pub release_limit: usize,
    pub jvm_args: Vec<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            game_dir: default_data_dir().join("minecraft"),
            java_path: PathBuf::from("java"),
            custom_client_jar: None,
            manifest_url: VERSION_MANIFEST_URL.into(),
            resource_base_url: RESOURCES_URL.into(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: 60,
            connect_timeout_secs: 15,
            verify_checksums: false,
            release_limit: DEFAULT_RELEASE_LIMIT,
            jvm_args: Vec::new(),
        }
    }
}

impl LauncherSettings {
    /// Load from `data_dir`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = settings_path(data_dir);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(data_dir).map_err(|source| LauncherError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let path = settings_path(data_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| LauncherError::Io { path, source })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Remember `jar` as the client jar override, stored as an absolute path.
    pub fn set_custom_client_jar(&mut self, jar: &Path) -> LauncherResult<()> {
        self.custom_client_jar = Some(absolute_path(jar)?);
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// `path` resolved against the current directory.
pub fn absolute_path(path: &Path) -> LauncherResult<PathBuf> {
    std::path::absolute(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// `<platform data dir>/InstantMC`, or `./InstantMC` when unknown.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
