// ─── InstantMC Core ───
// Version resolution and artifact acquisition for an offline launcher.
//
// Architecture:
//   core/
//     version/    : Mojang manifest + version JSON + OS rules
//     downloader/ : Idempotent, bounded-concurrency downloads
//     assets/     : Asset index + content-addressed objects
//     install/    : Libraries → client jar → assets for one version
//     launch/     : Classpath builder + process spawner
//     state/      : Settings + per-user session
//     profile     : Saved username/server profiles
//     auth        : Offline identity (no authentication)

pub mod assets;
pub mod auth;
pub mod cancel;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod launch;
pub mod profile;
pub mod state;
pub mod version;
