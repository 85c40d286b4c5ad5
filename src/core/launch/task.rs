// ─── Launch Task ───
// Spawns the game process with the correct arguments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info};

use crate::core::auth::OfflineIdentity;
use crate::core::error::{LauncherError, LauncherResult};

use super::classpath::safe_path_str;

pub const DEFAULT_SERVER_PORT: u16 = 25565;

/// Server to join directly after start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
}

impl ServerTarget {
    /// Build a target from free-text form fields.
    ///
    /// A blank host means no server; a blank port means 25565.
    pub fn from_fields(host: Option<&str>, port: Option<&str>) -> LauncherResult<Option<Self>> {
        let host = host.map(str::trim).unwrap_or_default();
        if host.is_empty() {
            return Ok(None);
        }

        let port = match port.map(str::trim).filter(|p| !p.is_empty()) {
            None => DEFAULT_SERVER_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                LauncherError::Configuration(format!("Invalid server port: {:?}", raw))
            })?,
        };

        Ok(Some(Self {
            host: host.to_string(),
            port,
        }))
    }
}

/// Everything needed to render one invocation of the runtime.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub java_path: PathBuf,
    pub jvm_args: Vec<String>,
    pub classpath: String,
    pub main_class: String,
    pub version_id: String,
    pub game_dir: PathBuf,
    pub asset_index_id: String,
    pub identity: OfflineIdentity,
    pub server: Option<ServerTarget>,
}

/// Handle of a spawned, detached game process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchHandle {
    pub pid: u32,
}

/// Render the argument vector passed to the runtime (program excluded).
pub fn build_launch_args(request: &LaunchRequest) -> LauncherResult<Vec<String>> {
    if request.identity.is_blank() {
        return Err(LauncherError::Configuration("Enter a username".into()));
    }
    if request.classpath.trim().is_empty() {
        return Err(LauncherError::Configuration(
            "Empty classpath: refusing to start the runtime".into(),
        ));
    }

    let game_dir = safe_path_str(&request.game_dir);
    let assets_dir = safe_path_str(&request.game_dir.join("assets"));

    let mut args: Vec<String> = request.jvm_args.clone();
    args.extend([
        "-cp".to_string(),
        request.classpath.clone(),
        request.main_class.clone(),
        "--username".into(),
        request.identity.username.clone(),
        "--version".into(),
        request.version_id.clone(),
        "--gameDir".into(),
        game_dir,
        "--assetsDir".into(),
        assets_dir,
        "--assetIndex".into(),
        request.asset_index_id.clone(),
        "--accessToken".into(),
        request.identity.access_token.clone(),
        "--userType".into(),
        request.identity.user_type.clone(),
        "--online-mode".into(),
        "false".into(),
    ]);

    if let Some(server) = &request.server {
        args.extend([
            "--server".to_string(),
            server.host.clone(),
            "--port".to_string(),
            server.port.to_string(),
        ]);
    }

    Ok(args)
}

/// Launch the game as a detached child process.
///
/// Returns immediately after spawning; the exit status is never collected.
pub fn launch(request: &LaunchRequest) -> LauncherResult<LaunchHandle> {
    let args = build_launch_args(request)?;

    let mut cmd = std::process::Command::new(&request.java_path);
    cmd.args(&args);
    if request.game_dir.is_dir() {
        cmd.current_dir(&request.game_dir);
    }
    cmd.stdin(Stdio::null());

    info!(
        "Launching {} as {} with {:?}",
        request.version_id, request.identity.username, request.java_path
    );
    debug!("Command (copy/paste): {}", format_command_for_logs(&request.java_path, &args));

    let child = cmd.spawn().map_err(|source| LauncherError::Launch {
        program: request.java_path.clone(),
        source,
    })?;

    Ok(LaunchHandle { pid: child.id() })
}

fn format_command_for_logs(program: &Path, args: &[String]) -> String {
    let program = shell_escape(&program.to_string_lossy());
    let args = args
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
