//! Service handles for systemd and OpenRC.

use std::path::{Path, PathBuf};

use roleboot_core::{ServiceError, ServiceHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{PlatformConfig, ServiceCommands};
use crate::exec::{self, Exit};

/// Init system supervising the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManager {
    Systemd,
    OpenRc,
}

impl ServiceManager {
    /// The configured manager, else systemd when it is running, else OpenRC.
    pub fn detect(config: &PlatformConfig) -> Self {
        if let Some(manager) = config.service_manager {
            return manager;
        }
        if config.exists("/run/systemd/system") {
            ServiceManager::Systemd
        } else {
            ServiceManager::OpenRc
        }
    }

    /// Handle for `unit`. `env_file` holds join material the service
    /// process must see in its environment.
    pub fn handle(
        &self,
        unit: &str,
        env_file: Option<PathBuf>,
        config: &PlatformConfig,
    ) -> Box<dyn ServiceHandle> {
        match self {
            ServiceManager::Systemd => {
                Box::new(SystemdUnit::new(unit, config).with_env_file(env_file))
            }
            ServiceManager::OpenRc => {
                Box::new(OpenRcService::new(unit, config).with_env_file(env_file))
            }
        }
    }
}

fn run(program: &str, args: &[&str]) -> Result<(), ServiceError> {
    match exec::run(program, args) {
        Ok(Exit::Success) => Ok(()),
        Ok(Exit::Failed(status)) => Err(ServiceError::Status {
            command: format!("{program} {}", args.join(" ")),
            status,
        }),
        Err(source) => Err(ServiceError::Spawn {
            program: program.to_string(),
            source,
        }),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ServiceError> {
    let err = |source| ServiceError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(err)?;
    }
    std::fs::write(path, contents).map_err(err)
}

/// Escape `value` for use inside a double-quoted shell string.
fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ── systemd ────────────────────────────────────────────────────────

/// A systemd unit whose `ExecStart` is replaced through a drop-in.
#[derive(Debug, Clone)]
pub struct SystemdUnit {
    name: String,
    unit_dir: PathBuf,
    env_file: Option<PathBuf>,
    commands: ServiceCommands,
}

impl SystemdUnit {
    pub fn new(name: &str, config: &PlatformConfig) -> Self {
        Self {
            name: name.to_string(),
            unit_dir: config.path("/etc/systemd/system"),
            env_file: None,
            commands: config.commands.clone(),
        }
    }

    pub fn with_env_file(mut self, env_file: Option<PathBuf>) -> Self {
        self.env_file = env_file;
        self
    }

    pub fn override_path(&self) -> PathBuf {
        self.unit_dir
            .join(format!("{}.service.d", self.name))
            .join("override.conf")
    }
}

impl ServiceHandle for SystemdUnit {
    fn override_start_command(&mut self, cmd: &str) -> Result<(), ServiceError> {
        let path = self.override_path();
        let mut drop_in = String::from("[Service]\n");
        if let Some(env) = &self.env_file {
            // '-' tolerates a missing file.
            drop_in.push_str(&format!("EnvironmentFile=-{}\n", env.display()));
        }
        // The empty ExecStart= clears the vendor command before replacing it.
        drop_in.push_str(&format!("ExecStart=\nExecStart={cmd}\n"));
        write_file(&path, &drop_in)?;
        debug!(unit = %self.name, path = ?path, "start command overridden");
        run(&self.commands.systemctl, &["daemon-reload"])
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        run(&self.commands.systemctl, &["start", &self.name])?;
        info!(unit = %self.name, "service started");
        Ok(())
    }

    fn enable(&mut self) -> Result<(), ServiceError> {
        run(&self.commands.systemctl, &["enable", &self.name])?;
        info!(unit = %self.name, "service enabled");
        Ok(())
    }
}

// ── OpenRC ─────────────────────────────────────────────────────────

/// An OpenRC service whose init script is generated from the command.
#[derive(Debug, Clone)]
pub struct OpenRcService {
    name: String,
    init_dir: PathBuf,
    env_file: Option<PathBuf>,
    commands: ServiceCommands,
}

impl OpenRcService {
    pub fn new(name: &str, config: &PlatformConfig) -> Self {
        Self {
            name: name.to_string(),
            init_dir: config.path("/etc/init.d"),
            env_file: None,
            commands: config.commands.clone(),
        }
    }

    pub fn with_env_file(mut self, env_file: Option<PathBuf>) -> Self {
        self.env_file = env_file;
        self
    }

    pub fn script_path(&self) -> PathBuf {
        self.init_dir.join(&self.name)
    }

    fn script(&self, cmd: &str) -> String {
        let (program, args) = cmd.split_once(' ').unwrap_or((cmd, ""));
        let mut script = String::from("#!/sbin/openrc-run\n\n");
        if let Some(env) = &self.env_file {
            // Sourced with allexport so the supervised process inherits it.
            let env = shell_quote(&env.display().to_string());
            script.push_str(&format!(
                "set -a\nif [ -f \"{env}\" ]; then\n    . \"{env}\"\nfi\nset +a\n\n"
            ));
        }
        script.push_str(&format!(
            "name=\"{name}\"\n\
             command=\"{program}\"\n\
             command_args=\"{args}\"\n\
             command_background=\"yes\"\n\
             pidfile=\"/run/{name}.pid\"\n\
             \n\
             depend() {{\n\
             \x20   need net\n\
             }}\n",
            name = self.name,
            program = shell_quote(program),
            args = shell_quote(args),
        ));
        script
    }
}

impl ServiceHandle for OpenRcService {
    fn override_start_command(&mut self, cmd: &str) -> Result<(), ServiceError> {
        let path = self.script_path();
        write_file(&path, &self.script(cmd))?;
        make_executable(&path)?;
        debug!(service = %self.name, path = ?path, "init script written");
        Ok(())
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        run(&self.commands.rc_service, &[&self.name, "start"])?;
        info!(service = %self.name, "service started");
        Ok(())
    }

    fn enable(&mut self) -> Result<(), ServiceError> {
        run(&self.commands.rc_update, &["add", &self.name, "default"])?;
        info!(service = %self.name, "service enabled");
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ServiceError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|source| {
        ServiceError::Io {
            path: path.display().to_string(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ServiceError> {
    Ok(())
}
