//! Role bootstrap orchestrator.
//!
//! Turns an unassigned node into a configured worker. Each call to
//! [`RoleBootstrap::attempt`] is one bounded pass over the sequence: it
//! either stops early because a precondition is missing (`Deferred`), fails,
//! or runs to the end and seals the node with the sentinel. The caller owns
//! the retry loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::descriptor::{AddressResolver, OrchestrationContext, PlatformDetector, StaticAddress};
use crate::error::{BootstrapError, Severity};
use crate::hooks::{HookRunner, NoopHooks};
use crate::sentinel::SentinelGate;
use crate::store::CoordinationStore;
use crate::types::*;

/// Drives a node through the worker bootstrap sequence.
pub struct RoleBootstrap {
    node_id: NodeId,
    store: Arc<dyn CoordinationStore>,
    sentinel: Arc<dyn SentinelGate>,
    detector: Arc<dyn PlatformDetector>,
    address: Arc<dyn AddressResolver>,
    hooks: Arc<dyn HookRunner>,
    /// Role forced by local configuration, published on every attempt.
    forced_role: Option<Role>,
    phase: BootstrapPhase,
}

impl RoleBootstrap {
    /// Create an orchestrator with no forced role, no hooks and no
    /// advertised address.
    pub fn new(
        node_id: impl Into<NodeId>,
        store: Arc<dyn CoordinationStore>,
        sentinel: Arc<dyn SentinelGate>,
        detector: Arc<dyn PlatformDetector>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            store,
            sentinel,
            detector,
            address: Arc::new(StaticAddress::default()),
            hooks: Arc::new(NoopHooks),
            forced_role: None,
            phase: BootstrapPhase::Unassigned,
        }
    }

    /// Declare a role for this node on every attempt.
    pub fn with_forced_role(mut self, role: Option<Role>) -> Self {
        self.forced_role = role;
        self
    }

    /// Set the resolver for the address this node publishes.
    pub fn with_address_resolver(mut self, address: Arc<dyn AddressResolver>) -> Self {
        self.address = address;
        self
    }

    /// Set the runner for the before/after worker hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn HookRunner>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Furthest phase observed so far.
    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Run one bootstrap pass.
    pub fn attempt(&mut self) -> BootstrapOutcome {
        match self.try_attempt() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    node_id = %self.node_id,
                    phase = %self.phase,
                    severity = ?e.severity(),
                    error = %e,
                    "bootstrap attempt failed"
                );
                BootstrapOutcome::Failed(e)
            }
        }
    }

    fn try_attempt(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        if let Some(role) = self.forced_role {
            // Published before any gate so auto-assigners can see it.
            self.store
                .set(ROLE_NAMESPACE, &self.node_id, role.as_str())
                .map_err(BootstrapError::RoleDeclaration)?;
            self.advance(BootstrapPhase::RoleDeclared);
        }

        if self.sentinel.exists() {
            debug!(node_id = %self.node_id, "node already bootstrapped, nothing to do");
            self.advance(BootstrapPhase::Sealed);
            return Ok(BootstrapOutcome::Completed(Completion::AlreadySealed));
        }

        self.advance(BootstrapPhase::AwaitingLeader);
        let leader = self
            .store
            .get(CLUSTER_NAMESPACE, LEADER_ADDRESS_KEY)
            .map_err(|source| BootstrapError::StoreRead {
                namespace: CLUSTER_NAMESPACE,
                key: LEADER_ADDRESS_KEY.to_string(),
                source,
            })?
            .filter(|addr| !addr.is_empty());
        let Some(leader) = leader else {
            info!(node_id = %self.node_id, "leader address not published yet");
            return Ok(BootstrapOutcome::Deferred(DeferReason::LeaderAddressUnknown));
        };

        let mut node = self
            .detector
            .detect()
            .map_err(BootstrapError::PlatformDetection)?;

        let address = self.address.resolve().filter(|a| !a.is_empty());
        if let Some(addr) = &address {
            if let Err(e) = self.store.set(IP_NAMESPACE, &self.node_id, addr) {
                warn!(
                    node_id = %self.node_id,
                    severity = ?Severity::Advisory,
                    error = %e,
                    "failed to publish node address"
                );
            }
        }

        node.set_role(Role::Worker);
        node.set_context(OrchestrationContext {
            node_id: self.node_id.clone(),
            store: self.store.clone(),
        });
        node.set_self_address(address);

        self.advance(BootstrapPhase::AwaitingToken);
        let token = match node.retrieve_join_token() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(node_id = %self.node_id, error = %e, "join token lookup failed");
                None
            }
        };
        let Some(token) = token else {
            info!(node_id = %self.node_id, platform = node.platform(), "join token not available yet");
            return Ok(BootstrapOutcome::Deferred(DeferReason::JoinTokenUnavailable));
        };

        self.advance(BootstrapPhase::Configuring);
        self.run_hook(HOOK_BEFORE_WORKER);

        node.perform_worker_setup(&leader, &token)
            .map_err(BootstrapError::WorkerSetup)?;

        let bin = node
            .runtime_binary_path()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BootstrapError::MissingBinary {
                platform: node.platform().to_string(),
            })?;

        let args = node.compute_worker_args().map_err(BootstrapError::WorkerArgs)?;
        let mut svc = node
            .acquire_service_handle()
            .map_err(BootstrapError::ServiceHandle)?;

        let cmd = start_command(&bin, node.role_name(), &args);
        info!(node_id = %self.node_id, platform = node.platform(), %leader, "configuring worker");
        svc.override_start_command(&cmd)
            .map_err(|source| BootstrapError::Service { step: "override", source })?;
        svc.start()
            .map_err(|source| BootstrapError::Service { step: "start", source })?;
        self.advance(BootstrapPhase::Started);
        svc.enable()
            .map_err(|source| BootstrapError::Service { step: "enable", source })?;

        self.run_hook(HOOK_AFTER_WORKER);

        self.sentinel.create()?;
        self.advance(BootstrapPhase::Sealed);
        info!(node_id = %self.node_id, platform = node.platform(), "worker bootstrap complete");
        Ok(BootstrapOutcome::Completed(Completion::Sealed))
    }

    fn run_hook(&self, hook: &str) {
        if let Err(e) = self.hooks.run(hook) {
            warn!(node_id = %self.node_id, %hook, error = %e, "hook failed, continuing");
        }
    }

    fn advance(&mut self, phase: BootstrapPhase) {
        if phase > self.phase {
            debug!(node_id = %self.node_id, from = %self.phase, to = %phase, "bootstrap phase");
            self.phase = phase;
        }
    }
}

/// `<binary> <role name> <args...>`, single-space separated.
fn start_command(bin: &str, role_name: &str, args: &[String]) -> String {
    let mut parts = vec![bin, role_name];
    parts.extend(args.iter().map(String::as_str));
    parts.join(" ")
}
