//! Platform descriptor contracts.
//!
//! A descriptor abstracts the local Kubernetes distribution: where its
//! binary lives, how a worker joins, which arguments the worker runs with,
//! and which service unit supervises it.

use std::fmt;
use std::sync::Arc;

use crate::error::{DescriptorResult, ServiceError};
use crate::store::CoordinationStore;
use crate::types::{NodeId, Role};

/// State handed to a descriptor so later operations can reach the cluster.
#[derive(Clone)]
pub struct OrchestrationContext {
    pub node_id: NodeId,
    pub store: Arc<dyn CoordinationStore>,
}

impl fmt::Debug for OrchestrationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestrationContext")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

/// Resolves a descriptor for the local platform.
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> DescriptorResult<Box<dyn NodeDescriptor>>;
}

/// Distribution-specific view of the local node.
pub trait NodeDescriptor: Send {
    fn set_role(&mut self, role: Role);
    fn set_context(&mut self, ctx: OrchestrationContext);
    fn set_self_address(&mut self, addr: Option<String>);

    /// Join token for this node, `None` until the leader hands one out.
    fn retrieve_join_token(&self) -> DescriptorResult<Option<String>>;

    /// Write whatever the distribution needs to join `leader_address`.
    fn perform_worker_setup(&mut self, leader_address: &str, join_token: &str)
    -> DescriptorResult<()>;

    /// Path of the distribution binary, `None` when not installed.
    fn runtime_binary_path(&self) -> Option<String>;

    fn compute_worker_args(&self) -> DescriptorResult<Vec<String>>;

    fn acquire_service_handle(&self) -> DescriptorResult<Box<dyn ServiceHandle>>;

    fn role(&self) -> Role;

    /// Subcommand the distribution binary runs for the current role,
    /// e.g. `agent` for a k3s worker.
    fn role_name(&self) -> &str;

    /// Short distribution name, e.g. `k3s`.
    fn platform(&self) -> &str;
}

/// Handle on the OS service supervising the worker process.
pub trait ServiceHandle: Send {
    fn override_start_command(&mut self, cmd: &str) -> Result<(), ServiceError>;
    fn start(&mut self) -> Result<(), ServiceError>;
    fn enable(&mut self) -> Result<(), ServiceError>;
}

/// Computes the address this node advertises to the cluster.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self) -> Option<String>;
}

/// Fixed address, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticAddress(pub Option<String>);

impl AddressResolver for StaticAddress {
    fn resolve(&self) -> Option<String> {
        self.0.clone()
    }
}
