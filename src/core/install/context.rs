use std::path::Path;

use crate::core::cancel::CancellationToken;
use crate::core::downloader::Downloader;
use crate::core::version::{OsName, VersionDetails};

/// Everything one install run needs, borrowed from the session.
pub struct InstallContext<'a> {
    pub details: &'a VersionDetails,
    /// Version JSON as received, persisted next to the client jar.
    pub raw_json: &'a [u8],
    pub game_dir: &'a Path,
    pub downloader: &'a Downloader,
    pub resource_base: &'a str,
    pub os: OsName,
    pub client_jar_override: Option<&'a Path>,
    pub cancel: &'a CancellationToken,
}
