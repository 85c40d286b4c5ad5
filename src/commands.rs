use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::core::auth::OfflineIdentity;
use crate::core::cancel::CancellationToken;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallReport;
use crate::core::launch::ServerTarget;
use crate::core::profile::{Profile, ProfileStore};
use crate::core::state::{default_data_dir, LauncherSettings, Session};
use crate::core::version::{VersionFilter, VersionKind};

#[derive(Debug, Parser)]
#[command(name = "instantmc", version, about = "Offline Minecraft launcher")]
pub struct Cli {
    /// Where settings and profiles live.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Game directory (versions/, libraries/, assets/, mods/).
    #[arg(long, global = true)]
    pub game_dir: Option<PathBuf>,

    /// Java executable used to start the game.
    #[arg(long, global = true)]
    pub java: Option<PathBuf>,

    /// Verify SHA-1 checksums of downloaded and existing files.
    #[arg(long, global = true)]
    pub verify_checksums: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List published versions.
    Versions {
        /// Include snapshots and old versions, without a limit.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Download libraries, client jar and assets for a version.
    Install { version: String },
    /// Start the game.
    Launch(LaunchArgs),
    /// Manage saved profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    pub version: String,
    #[arg(long, short)]
    pub username: Option<String>,
    /// Take username and server from a saved profile.
    #[arg(long, short)]
    pub profile: Option<String>,
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub port: Option<String>,
    /// Custom client jar; remembered for later launches.
    #[arg(long)]
    pub jar: Option<PathBuf>,
    /// Install missing files before launching.
    #[arg(long)]
    pub install: bool,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    List,
    Save {
        username: String,
        #[arg(long, default_value = "")]
        server: String,
        #[arg(long, default_value = "")]
        port: String,
    },
    Remove { username: String },
}

/// Settings from disk with command line overrides applied.
fn effective_settings(cli: &Cli, data_dir: &std::path::Path) -> LauncherSettings {
    let mut settings = LauncherSettings::load(data_dir);
    if let Some(game_dir) = &cli.game_dir {
        settings.game_dir = game_dir.clone();
    }
    if let Some(java) = &cli.java {
        settings.java_path = java.clone();
    }
    if cli.verify_checksums {
        settings.verify_checksums = true;
    }
    settings
}

pub async fn execute(cli: Cli) -> LauncherResult<()> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let settings = effective_settings(&cli, &data_dir);

    match cli.command {
        Command::Versions { all, limit } => {
            let mut filter = if all {
                VersionFilter::all()
            } else {
                VersionFilter {
                    limit: Some(settings.release_limit),
                    ..VersionFilter::default()
                }
            };
            if limit.is_some() {
                filter.limit = limit;
            }
            let session = Session::new(settings)?;
            for version in session.list_versions(filter).await? {
                let kind = match version.kind {
                    VersionKind::Release => "release",
                    VersionKind::Snapshot => "snapshot",
                    VersionKind::Other => "other",
                };
                println!("{:<24} {}", version.id, kind);
            }
            Ok(())
        }
        Command::Install { version } => {
            let mut session = Session::new(settings)?;
            session.select_version(&version).await?;
            let report = session.install(&cancel_on_ctrl_c()).await?;
            print_install_report(&report);
            Ok(())
        }
        Command::Launch(args) => launch(args, settings, &data_dir).await,
        Command::Profile(command) => profile(command, &data_dir),
    }
}

async fn launch(
    args: LaunchArgs,
    mut settings: LauncherSettings,
    data_dir: &std::path::Path,
) -> LauncherResult<()> {
    let profile = match &args.profile {
        Some(name) => Some(ProfileStore::load(data_dir)?.get(name).cloned().ok_or_else(
            || LauncherError::Configuration(format!("Unknown profile {:?}", name)),
        )?),
        None => None,
    };

    let username = args
        .username
        .clone()
        .or_else(|| profile.as_ref().map(|p| p.username.clone()))
        .unwrap_or_default();
    let host = args
        .server
        .clone()
        .or_else(|| profile.as_ref().map(|p| p.server_host.clone()));
    let port = args
        .port
        .clone()
        .or_else(|| profile.as_ref().map(|p| p.server_port.clone()));

    let identity = OfflineIdentity::new(&username);
    if identity.is_blank() {
        return Err(LauncherError::Configuration("Enter a username!".into()));
    }
    let server = ServerTarget::from_fields(host.as_deref(), port.as_deref())?;

    if let Some(jar) = &args.jar {
        settings.set_custom_client_jar(jar)?;
        settings.save(data_dir)?;
    }

    let mut session = Session::new(settings)?;
    session.select_version(&args.version).await?;
    if args.install {
        let report = session.install(&cancel_on_ctrl_c()).await?;
        print_install_report(&report);
    }

    let handle = session.launch(identity, server)?;
    println!("Started {} (pid {})", args.version, handle.pid);
    Ok(())
}

fn profile(command: ProfileCommand, data_dir: &std::path::Path) -> LauncherResult<()> {
    let mut store = ProfileStore::load(data_dir)?;
    match command {
        ProfileCommand::List => {
            for profile in store.list() {
                if profile.server_host.is_empty() {
                    println!("{}", profile.username);
                } else {
                    let port = if profile.server_port.is_empty() {
                        "25565"
                    } else {
                        profile.server_port.as_str()
                    };
                    println!("{}  {}:{}", profile.username, profile.server_host, port);
                }
            }
        }
        ProfileCommand::Save {
            username,
            server,
            port,
        } => {
            store.upsert(Profile {
                username,
                server_host: server,
                server_port: port,
            })?;
            store.save()?;
            info!("Profile saved");
        }
        ProfileCommand::Remove { username } => {
            if store.remove(&username).is_none() {
                return Err(LauncherError::Configuration(format!(
                    "Unknown profile {:?}",
                    username
                )));
            }
            store.save()?;
        }
    }
    Ok(())
}

fn print_install_report(report: &InstallReport) {
    println!(
        "Libraries: {} downloaded, {} present, {} failed",
        report.libraries.downloaded,
        report.libraries.skipped,
        report.libraries.failed()
    );
    println!("Client jar: {}", report.client_jar.display());
    println!(
        "Assets: {} downloaded, {} present, {} failed",
        report.assets.downloaded, report.assets.skipped, report.assets.failed
    );
    if report.failed() > 0 {
        warn!(
            "{} files failed to download; run install again to retry them",
            report.failed()
        );
    }
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = handle.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    warn!("Cancelling after the current transfers finish...");
                    handle.cancel();
                }
            }
        }
    });
    token
}
