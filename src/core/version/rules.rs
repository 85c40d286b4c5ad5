// ─── Platform Rules ───
// Decides whether a library entry applies to the host operating system.

use serde::Deserialize;

use super::version_file::LibraryEntry;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// Host platform bucket. Mojang metadata calls macOS `osx`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OsName {
    Windows,
    Linux,
    #[serde(alias = "osx")]
    Macos,
    /// Any OS name we do not recognise; never matches the host.
    #[serde(other)]
    Unknown,
}

impl OsName {
    /// Bucket the build target into one of windows, linux, macos.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsName::Windows
        } else if cfg!(target_os = "macos") {
            OsName::Macos
        } else {
            OsName::Linux
        }
    }
}

impl std::fmt::Display for OsName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsName::Windows => write!(f, "windows"),
            OsName::Linux => write!(f, "linux"),
            OsName::Macos => write!(f, "macos"),
            OsName::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<OsName>,
}

impl PlatformRule {
    pub fn new(action: RuleAction, os: Option<OsName>) -> Self {
        Self {
            action,
            os: os.map(|name| OsRule { name: Some(name) }),
        }
    }

    /// A rule without an OS constraint applies everywhere.
    pub fn matches(&self, os: OsName) -> bool {
        match self.os.as_ref().and_then(|rule| rule.name) {
            None => true,
            Some(name) => name != OsName::Unknown && name == os,
        }
    }
}

/// Evaluate a library's rules against `os`.
///
/// - No rules: allowed.
/// - Otherwise the first rule that matches `os` decides.
/// - If none matches, the outcome is whether the *first* rule is `allow`.
///
/// The last branch is a known quirk, not Mojang's last-match semantics.
/// Change it only after checking against real manifests.
pub fn is_allowed(library: &LibraryEntry, os: OsName) -> bool {
    let Some(first) = library.rules.first() else {
        return true;
    };

    if let Some(rule) = library.rules.iter().find(|rule| rule.matches(os)) {
        return rule.action == RuleAction::Allow;
    }

    first.action == RuleAction::Allow
}
