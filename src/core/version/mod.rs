pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{list_versions, VersionFilter, VersionKind, VersionManifest, VersionSummary};
pub use rules::{is_allowed, OsName, PlatformRule, RuleAction};
pub use version_file::{AssetIndexRef, ClientArtifact, LibraryArtifact, LibraryEntry, VersionDetails};
