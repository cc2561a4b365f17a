//! Wires the configured collaborators into a `RoleBootstrap`.

use std::sync::Arc;

use roleboot_core::{FileSentinel, HookRunner, NoopHooks, RoleBootstrap};
use roleboot_node::{CommandHookRunner, DistroDetector, LocalAddress};
use roleboot_state::StateStore;
use tracing::info;

use crate::config::RolebootConfig;

/// Open the local store replica named by the config.
pub fn open_store(config: &RolebootConfig) -> anyhow::Result<StateStore> {
    let path = config.store_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = StateStore::open(&path)?;
    info!(path = ?path, "coordination store opened");
    Ok(store)
}

/// Build the orchestrator on top of an already opened store.
pub fn build_bootstrap(config: &RolebootConfig, store: StateStore) -> anyhow::Result<RoleBootstrap> {
    let node_id = config.node_id()?;

    let mut address = LocalAddress::new(config.network.address.clone());
    if let Some(probe) = &config.network.probe {
        address = address.with_probe(probe.clone());
    }

    let hooks: Arc<dyn HookRunner> = match &config.hooks.program {
        Some(program) => Arc::new(CommandHookRunner::new(
            program.clone(),
            config.hooks.stage_prefix.clone(),
        )),
        None => Arc::new(NoopHooks),
    };

    info!(
        %node_id,
        role = ?config.role,
        sentinel = ?config.sentinel_path(),
        "bootstrap orchestrator assembled"
    );

    Ok(RoleBootstrap::new(
        node_id,
        Arc::new(store),
        Arc::new(FileSentinel::new(config.sentinel_path())),
        Arc::new(DistroDetector::new(config.platform.clone())),
    )
    .with_forced_role(config.role)
    .with_address_resolver(Arc::new(address))
    .with_hooks(hooks))
}
