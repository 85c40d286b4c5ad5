// ─── Classpath Builder ───
// Orders the local files the runtime loads code from.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{is_allowed, OsName, VersionDetails};

/// Everything the launch step needs from disk, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFileSet {
    pub classpath: Vec<PathBuf>,
    pub client_jar: PathBuf,
    pub assets_dir: PathBuf,
    /// The version's asset index has been written under `assets/indexes`.
    pub assets_present: bool,
}

impl ResolvedFileSet {
    /// Classpath rendered with the host separator.
    pub fn joined(&self) -> String {
        self.classpath
            .iter()
            .map(|p| safe_path_str(p))
            .collect::<Vec<_>>()
            .join(get_classpath_separator())
    }
}

pub fn libraries_dir(game_dir: &Path) -> PathBuf {
    game_dir.join("libraries")
}

pub fn version_dir(game_dir: &Path, version_id: &str) -> PathBuf {
    game_dir.join("versions").join(version_id)
}

/// `gameDir/versions/{id}/{id}.jar`
pub fn client_jar_path(game_dir: &Path, version_id: &str) -> PathBuf {
    version_dir(game_dir, version_id).join(format!("{}.jar", version_id))
}

pub fn mods_dir(game_dir: &Path) -> PathBuf {
    game_dir.join("mods")
}

/// Builds the ordered classpath for `details`.
///
/// Order:
/// 1. platform-allowed libraries present on disk, manifest order
/// 2. the client jar (`client_jar_override` if given)
/// 3. `*.jar` files directly inside `gameDir/mods`, listing order
///
/// Libraries missing on disk are skipped; a missing client jar is an error.
pub fn build_classpath(
    details: &VersionDetails,
    game_dir: &Path,
    os: OsName,
    client_jar_override: Option<&Path>,
) -> LauncherResult<ResolvedFileSet> {
    let libs_dir = libraries_dir(game_dir);
    let mut entries: Vec<PathBuf> = Vec::new();

    // 1. Libraries
    for lib in &details.libraries {
        if !is_allowed(lib, os) {
            continue;
        }
        let Some(path) = lib.local_path(&libs_dir) else {
            continue;
        };
        if path.is_file() {
            entries.push(path);
        } else {
            debug!("Library not found on disk (skipping): {}", lib.name);
        }
    }

    // 2. Client jar
    let client_jar = match client_jar_override {
        Some(path) => path.to_path_buf(),
        None => client_jar_path(game_dir, &details.id),
    };
    if !client_jar.is_file() {
        return Err(LauncherError::Configuration(format!(
            "Client jar for {} not found at {:?}",
            details.id, client_jar
        )));
    }
    entries.push(client_jar.clone());

    // 3. Mods
    let mods = collect_mod_jars(&mods_dir(game_dir));
    if !mods.is_empty() {
        debug!("Found {} mod JARs", mods.len());
    }
    entries.extend(mods);

    let assets_dir = game_dir.join("assets");
    let assets_present = assets_dir
        .join("indexes")
        .join(format!("{}.json", details.asset_index.id))
        .is_file();

    Ok(ResolvedFileSet {
        classpath: entries,
        client_jar,
        assets_dir,
        assets_present,
    })
}

fn collect_mod_jars(mods_dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = std::fs::read_dir(mods_dir) else {
        return Vec::new();
    };

    read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_jar(path))
        .collect()
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}

/// Uses `;` on Windows, `:` on Linux/macOS.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Convert path to string, stripping the `\\?\` prefix Java cannot read.
pub fn safe_path_str(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::{
        AssetIndexRef, ClientArtifact, LibraryArtifact, LibraryEntry, PlatformRule, RuleAction,
    };

    fn temp_game_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("classpath-test-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn library(name: &str, rules: Vec<PlatformRule>) -> LibraryEntry {
        LibraryEntry {
            name: format!("com.example:{}:1.0", name),
            artifact: Some(LibraryArtifact {
                path: format!("com/example/{0}/1.0/{0}-1.0.jar", name),
                url: format!("https://libraries.example.com/{}.jar", name),
                size: 1,
                sha1: None,
            }),
            rules,
        }
    }

    fn details(libraries: Vec<LibraryEntry>) -> VersionDetails {
        VersionDetails {
            id: "1.20.4".into(),
            main_class: "net.minecraft.client.main.Main".into(),
            asset_index: AssetIndexRef {
                id: "12".into(),
                url: "https://example.com/12.json".into(),
            },
            client: ClientArtifact {
                url: "https://example.com/client.jar".into(),
                sha1: None,
            },
            libraries,
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn materialize(game_dir: &Path, details: &VersionDetails) {
        for lib in &details.libraries {
            if let Some(path) = lib.local_path(&libraries_dir(game_dir)) {
                touch(&path);
            }
        }
        touch(&client_jar_path(game_dir, &details.id));
    }

    #[test]
    fn build_classpath_orders_libraries_client_then_mods() {
        let game_dir = temp_game_dir("order");
        let details = details(vec![library("zeta", vec![]), library("alpha", vec![])]);
        materialize(&game_dir, &details);
        touch(&game_dir.join("mods/one.jar"));
        touch(&game_dir.join("mods/two.JAR"));
        touch(&game_dir.join("mods/readme.txt"));
        std::fs::create_dir_all(game_dir.join("mods/nested.jar")).unwrap();

        let resolved = build_classpath(&details, &game_dir, OsName::Linux, None).unwrap();
        let libs = libraries_dir(&game_dir);

        assert_eq!(resolved.classpath.len(), 5);
        assert_eq!(resolved.classpath[0], libs.join("com/example/zeta/1.0/zeta-1.0.jar"));
        assert_eq!(resolved.classpath[1], libs.join("com/example/alpha/1.0/alpha-1.0.jar"));
        assert_eq!(resolved.classpath[2], client_jar_path(&game_dir, "1.20.4"));
        let tail: Vec<_> = resolved.classpath[3..].to_vec();
        assert!(tail.contains(&game_dir.join("mods/one.jar")));
        assert!(tail.contains(&game_dir.join("mods/two.JAR")));

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[test]
    fn build_classpath_skips_disallowed_missing_and_metadata_only() {
        let game_dir = temp_game_dir("skips");
        let mut metadata_only = library("natives", vec![]);
        metadata_only.artifact = None;
        let details = details(vec![
            library("kept", vec![]),
            library(
                "mac-only",
                vec![
                    PlatformRule::new(RuleAction::Allow, Some(OsName::Macos)),
                    PlatformRule::new(RuleAction::Disallow, None),
                ],
            ),
            library("missing", vec![]),
            metadata_only,
        ]);
        materialize(&game_dir, &details);
        std::fs::remove_file(
            libraries_dir(&game_dir).join("com/example/missing/1.0/missing-1.0.jar"),
        )
        .unwrap();

        let resolved = build_classpath(&details, &game_dir, OsName::Linux, None).unwrap();
        assert_eq!(
            resolved.classpath,
            vec![
                libraries_dir(&game_dir).join("com/example/kept/1.0/kept-1.0.jar"),
                client_jar_path(&game_dir, "1.20.4"),
            ]
        );

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[test]
    fn build_classpath_requires_client_jar() {
        let game_dir = temp_game_dir("noclient");
        let details = details(vec![]);

        let err = build_classpath(&details, &game_dir, OsName::Linux, None).unwrap_err();
        assert!(matches!(err, LauncherError::Configuration(_)));

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[test]
    fn build_classpath_uses_override_jar() {
        let game_dir = temp_game_dir("override");
        let custom = game_dir.join("custom/client.jar");
        touch(&custom);
        touch(&game_dir.join("assets/indexes/12.json"));

        let resolved =
            build_classpath(&details(vec![]), &game_dir, OsName::Linux, Some(&custom)).unwrap();
        assert_eq!(resolved.classpath, vec![custom.clone()]);
        assert_eq!(resolved.client_jar, custom);
        assert!(resolved.assets_present);

        let _ = std::fs::remove_dir_all(&game_dir);
    }

    #[test]
    fn joined_uses_host_separator() {
        let resolved = ResolvedFileSet {
            classpath: vec![PathBuf::from("a.jar"), PathBuf::from("b.jar")],
            client_jar: PathBuf::from("b.jar"),
            assets_dir: PathBuf::from("assets"),
            assets_present: false,
        };
        assert_eq!(
            resolved.joined(),
            format!("a.jar{}b.jar", get_classpath_separator())
        );
    }
}
