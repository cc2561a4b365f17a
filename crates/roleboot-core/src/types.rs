//! Domain types for node role bootstrap.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

/// Stable identifier of the local node.
pub type NodeId = String;

/// Namespace holding role assignments, keyed by node id.
pub const ROLE_NAMESPACE: &str = "role";

/// Namespace holding cluster-wide join information.
pub const CLUSTER_NAMESPACE: &str = "cluster";

/// Namespace holding node addresses, keyed by node id.
pub const IP_NAMESPACE: &str = "ip";

/// Key under [`CLUSTER_NAMESPACE`] where the leader publishes its address.
pub const LEADER_ADDRESS_KEY: &str = "leader-address";

/// Hook run right before worker setup.
pub const HOOK_BEFORE_WORKER: &str = "bootstrap.before.worker";

/// Hook run after the worker service is enabled.
pub const HOOK_AFTER_WORKER: &str = "bootstrap.after.worker";

// ── Role ───────────────────────────────────────────────────────────

/// Role a node plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Master,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Master => "master",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "worker" => Ok(Role::Worker),
            "master" => Ok(Role::Master),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// ── Phase ──────────────────────────────────────────────────────────

/// Observed progress of the bootstrap state machine.
///
/// Ordered: a node only ever moves towards [`BootstrapPhase::Sealed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapPhase {
    Unassigned,
    RoleDeclared,
    AwaitingLeader,
    AwaitingToken,
    Configuring,
    Started,
    Sealed,
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BootstrapPhase::Unassigned => "unassigned",
            BootstrapPhase::RoleDeclared => "role-declared",
            BootstrapPhase::AwaitingLeader => "awaiting-leader",
            BootstrapPhase::AwaitingToken => "awaiting-token",
            BootstrapPhase::Configuring => "configuring",
            BootstrapPhase::Started => "started",
            BootstrapPhase::Sealed => "sealed",
        };
        f.write_str(s)
    }
}

// ── Outcome ────────────────────────────────────────────────────────

/// Precondition that was not met yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    LeaderAddressUnknown,
    JoinTokenUnavailable,
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferReason::LeaderAddressUnknown => f.write_str("leader address not published yet"),
            DeferReason::JoinTokenUnavailable => f.write_str("join token not available yet"),
        }
    }
}

/// How an attempt reached completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The sentinel was already present; nothing was done.
    AlreadySealed,
    /// This attempt configured the worker and sealed the node.
    Sealed,
}

/// Result of a single bootstrap attempt.
#[derive(Debug)]
pub enum BootstrapOutcome {
    Deferred(DeferReason),
    Completed(Completion),
    Failed(BootstrapError),
}

impl BootstrapOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BootstrapOutcome::Completed(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, BootstrapOutcome::Deferred(_))
    }

    /// Whether the caller should keep invoking the attempt.
    pub fn should_retry(&self) -> bool {
        match self {
            BootstrapOutcome::Deferred(_) => true,
            BootstrapOutcome::Completed(_) => false,
            BootstrapOutcome::Failed(e) => !e.is_fatal(),
        }
    }
}

impl From<BootstrapError> for BootstrapOutcome {
    fn from(e: BootstrapError) -> Self {
        BootstrapOutcome::Failed(e)
    }
}
