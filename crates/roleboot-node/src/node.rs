//! `NodeDescriptor` for k3s and k0s nodes.

use std::net::Ipv6Addr;
use std::sync::Arc;

use roleboot_core::{
    CLUSTER_NAMESPACE, DescriptorError, DescriptorResult, NodeDescriptor, OrchestrationContext,
    Role, ServiceHandle,
};
use tracing::{debug, info};

use crate::config::PlatformConfig;
use crate::distro::Distro;
use crate::service::ServiceManager;

/// Environment file read by the k3s agent unit.
pub const K3S_AGENT_ENV: &str = "/etc/systemd/system/k3s-agent.service.env";

/// Token file passed to `k0s worker --token-file`.
pub const K0S_TOKEN_FILE: &str = "/etc/k0s/worker-token";

/// Port the k3s supervisor listens on.
const K3S_SERVER_PORT: u16 = 6443;

/// A detected node running one of the supported distributions.
pub struct DistroNode {
    distro: Distro,
    config: Arc<PlatformConfig>,
    role: Role,
    ctx: Option<OrchestrationContext>,
    address: Option<String>,
}

impl DistroNode {
    pub fn new(distro: Distro, config: Arc<PlatformConfig>) -> Self {
        Self {
            distro,
            config,
            role: Role::Worker,
            ctx: None,
            address: None,
        }
    }

    pub fn distro(&self) -> Distro {
        self.distro
    }

    fn write(&self, absolute: &str, contents: &str) -> DescriptorResult<()> {
        let path = self.config.path(absolute);
        let err = |source| DescriptorError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(err)?;
        }
        std::fs::write(&path, contents).map_err(err)?;
        debug!(path = ?path, "join material written");
        Ok(())
    }
}

impl NodeDescriptor for DistroNode {
    fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    fn set_context(&mut self, ctx: OrchestrationContext) {
        self.ctx = Some(ctx);
    }

    fn set_self_address(&mut self, addr: Option<String>) {
        self.address = addr;
    }

    fn retrieve_join_token(&self) -> DescriptorResult<Option<String>> {
        let ctx = self.ctx.as_ref().ok_or(DescriptorError::MissingContext)?;
        Ok(ctx.store.get(CLUSTER_NAMESPACE, self.distro.token_key())?)
    }

    fn perform_worker_setup(
        &mut self,
        leader_address: &str,
        join_token: &str,
    ) -> DescriptorResult<()> {
        match self.distro {
            Distro::K3s => {
                let host = if leader_address.parse::<Ipv6Addr>().is_ok() {
                    format!("[{leader_address}]")
                } else {
                    leader_address.to_string()
                };
                self.write(
                    K3S_AGENT_ENV,
                    &format!(
                        "K3S_URL=https://{host}:{K3S_SERVER_PORT}\nK3S_TOKEN={join_token}\n"
                    ),
                )?;
            }
            Distro::K0s => self.write(K0S_TOKEN_FILE, join_token)?,
        }
        info!(distro = %self.distro, leader = %leader_address, "worker join configured");
        Ok(())
    }

    fn runtime_binary_path(&self) -> Option<String> {
        self.distro
            .binary_candidates()
            .iter()
            .map(|bin| self.config.path(bin))
            .find(|path| path.is_file())
            .map(|path| path.display().to_string())
    }

    fn compute_worker_args(&self) -> DescriptorResult<Vec<String>> {
        let mut args = Vec::new();
        match self.distro {
            Distro::K3s => {
                args.push("--with-node-id".to_string());
                if let Some(addr) = &self.address {
                    args.push("--node-ip".to_string());
                    args.push(addr.clone());
                }
            }
            Distro::K0s => {
                args.push("--token-file".to_string());
                args.push(self.config.path(K0S_TOKEN_FILE).display().to_string());
            }
        }
        args.extend(self.config.worker_args.iter().cloned());
        Ok(args)
    }

    fn acquire_service_handle(&self) -> DescriptorResult<Box<dyn ServiceHandle>> {
        let manager = ServiceManager::detect(&self.config);
        debug!(distro = %self.distro, ?manager, "service manager selected");
        let env_file = match self.distro {
            Distro::K3s => Some(self.config.path(K3S_AGENT_ENV)),
            Distro::K0s => None,
        };
        Ok(manager.handle(self.distro.worker_unit(), env_file, &self.config))
    }

    fn role(&self) -> Role {
        self.role
    }

    fn role_name(&self) -> &str {
        match (self.distro, self.role) {
            (Distro::K3s, Role::Worker) => "agent",
            (Distro::K3s, Role::Master) => "server",
            (Distro::K0s, Role::Worker) => "worker",
            (Distro::K0s, Role::Master) => "controller",
        }
    }

    fn platform(&self) -> &str {
        self.distro.name()
    }
}
