// ─── Profiles ───
// Saved username/server pairs, one per line as `username|host|port`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const PROFILES_FILE: &str = "profiles.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub server_host: String,
    pub server_port: String,
}

impl Profile {
    fn to_line(&self) -> String {
        format!("{}|{}|{}", self.username, self.server_host, self.server_port)
    }

    fn from_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split('|').collect();
        match parts.as_slice() {
            [username, host, port] if !username.trim().is_empty() => Some(Self {
                username: username.to_string(),
                server_host: host.to_string(),
                server_port: port.to_string(),
            }),
            _ => None,
        }
    }
}

/// Profiles keyed by username.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Read `profiles.txt` under `data_dir`. Malformed lines are ignored.
    pub fn load(data_dir: &Path) -> LauncherResult<Self> {
        let path = data_dir.join(PROFILES_FILE);
        let mut profiles = BTreeMap::new();

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                for line in raw.lines() {
                    match Profile::from_line(line) {
                        Some(profile) => {
                            profiles.insert(profile.username.clone(), profile);
                        }
                        None => debug!("Skipping malformed profile line: {:?}", line),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(LauncherError::Io { path, source }),
        }

        Ok(Self { path, profiles })
    }

    pub fn get(&self, username: &str) -> Option<&Profile> {
        self.profiles.get(username)
    }

    /// Profiles sorted by username.
    pub fn list(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn upsert(&mut self, profile: Profile) -> LauncherResult<()> {
        let username = profile.username.trim();
        if username.is_empty() {
            return Err(LauncherError::Configuration("Enter a username!".into()));
        }
        if [username, profile.server_host.as_str(), profile.server_port.as_str()]
            .iter()
            .any(|field| field.contains(['|', '\n']))
        {
            return Err(LauncherError::Configuration(
                "Profile fields cannot contain '|' or line breaks".into(),
            ));
        }

        let profile = Profile {
            username: username.to_string(),
            server_host: profile.server_host.trim().to_string(),
            server_port: profile.server_port.trim().to_string(),
        };
        self.profiles.insert(profile.username.clone(), profile);
        Ok(())
    }

    pub fn remove(&mut self, username: &str) -> Option<Profile> {
        self.profiles.remove(username)
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut body = String::new();
        for profile in self.profiles.values() {
            body.push_str(&profile.to_line());
            body.push('\n');
        }
        std::fs::write(&self.path, body).map_err(|source| LauncherError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
