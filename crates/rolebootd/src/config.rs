//! rolebootd configuration (TOML).
//!
//! ```toml
//! node_id = "node-a"          # optional, derived from /etc/machine-id otherwise
//! data_dir = "/var/lib/roleboot"
//! interval_secs = 10
//! role = "worker"             # optional forced role
//!
//! [network]
//! address = "10.0.0.9"        # optional, guessed otherwise
//!
//! [hooks]
//! program = "kairos-agent"
//! stage_prefix = "provider-roleboot"
//!
//! [platform]
//! distro = "k3s"
//! worker_args = ["--kubelet-arg=max-pods=50"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use roleboot_core::Role;
use roleboot_node::PlatformConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolebootConfig {
    pub node_id: Option<String>,
    pub data_dir: PathBuf,
    /// Coordination store replica; defaults to `<data_dir>/coordination.redb`.
    pub store_path: Option<PathBuf>,
    /// Sentinel marker; defaults to `<data_dir>/.bootstrapped`.
    pub sentinel_path: Option<PathBuf>,
    /// Seconds between bootstrap attempts.
    pub interval_secs: u64,
    /// Role forced by local configuration.
    pub role: Option<Role>,
    pub network: NetworkConfig,
    pub hooks: HooksConfig,
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub address: Option<String>,
    /// Address used to pick the outbound interface when guessing.
    pub probe: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Stage runner; hooks are disabled when unset.
    pub program: Option<String>,
    pub stage_prefix: String,
}

impl Default for RolebootConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            data_dir: PathBuf::from("/var/lib/roleboot"),
            store_path: None,
            sentinel_path: None,
            interval_secs: 10,
            role: None,
            network: NetworkConfig::default(),
            hooks: HooksConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            program: None,
            stage_prefix: "provider-roleboot".to_string(),
        }
    }
}

impl RolebootConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RolebootConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path).with_context(|| format!("invalid config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("coordination.redb"))
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.sentinel_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(".bootstrapped"))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// The configured node id, else one derived from the machine id.
    pub fn node_id(&self) -> anyhow::Result<String> {
        if let Some(id) = self.node_id.as_ref().filter(|id| !id.is_empty()) {
            return Ok(id.clone());
        }
        let path = self.platform.path("/etc/machine-id");
        let machine_id = std::fs::read_to_string(&path).unwrap_or_default();
        let machine_id = machine_id.trim();
        if machine_id.is_empty() {
            bail!(
                "no node_id configured and {} is missing or empty",
                path.display()
            );
        }
        let digest = hex::encode(Sha256::digest(machine_id.as_bytes()));
        Ok(digest[..16].to_string())
    }
}
