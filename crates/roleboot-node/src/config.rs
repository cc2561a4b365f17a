//! Platform configuration, embedded in the daemon's TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::distro::Distro;
use crate::service::ServiceManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Filesystem root all platform paths are resolved under.
    pub root: PathBuf,
    /// Pin the distribution instead of detecting it.
    pub distro: Option<Distro>,
    /// Pin the service manager instead of detecting it.
    pub service_manager: Option<ServiceManager>,
    /// Extra arguments appended to the worker command line.
    pub worker_args: Vec<String>,
    pub commands: ServiceCommands,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            distro: None,
            service_manager: None,
            worker_args: Vec::new(),
            commands: ServiceCommands::default(),
        }
    }
}

impl PlatformConfig {
    /// Resolve an absolute platform path (`/etc/...`) under [`Self::root`].
    pub fn path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    pub fn exists(&self, absolute: &str) -> bool {
        Path::exists(&self.path(absolute))
    }
}

/// Programs used to drive the service manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCommands {
    pub systemctl: String,
    pub rc_service: String,
    pub rc_update: String,
}

impl Default for ServiceCommands {
    fn default() -> Self {
        Self {
            systemctl: "systemctl".to_string(),
            rc_service: "rc-service".to_string(),
            rc_update: "rc-update".to_string(),
        }
    }
}
