use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Parsing ─────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid asset hash for {name}: {hash:?}")]
    InvalidAssetHash { name: String, hash: String },

    // ── Configuration ───────────────────────────────────
    #[error("Version not found in manifest: {0}")]
    VersionNotFound(String),

    #[error("No version selected")]
    NoSelection,

    #[error("{0}")]
    Configuration(String),

    // ── Launch ──────────────────────────────────────────
    #[error("Failed to start {program:?}: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    // ── Control ─────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Coarse failure classes shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Parse,
    Io,
    Launch,
    Configuration,
    Integrity,
    Cancelled,
}

impl LauncherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LauncherError::Io { .. } => ErrorCategory::Io,
            LauncherError::Http(_) | LauncherError::DownloadFailed { .. } => {
                ErrorCategory::Network
            }
            LauncherError::Sha1Mismatch { .. } => ErrorCategory::Integrity,
            LauncherError::Json(_) | LauncherError::InvalidAssetHash { .. } => {
                ErrorCategory::Parse
            }
            LauncherError::VersionNotFound(_)
            | LauncherError::NoSelection
            | LauncherError::Configuration(_) => ErrorCategory::Configuration,
            LauncherError::Launch { .. } => ErrorCategory::Launch,
            LauncherError::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
